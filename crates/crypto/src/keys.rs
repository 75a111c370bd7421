use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

use linkdrop_core::Address;

/// Signature scheme flag for Ed25519 keys
pub const ED25519_FLAG: u8 = 0x00;

type Blake2b256 = Blake2b<U32>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Secret key is empty")]
    EmptySecretKey,
    #[error("Secret key is not valid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid secret key length: expected 32 bytes, got {0}")]
    InvalidSecretKeyLength(usize),
    #[error("Secret key does not match its embedded public key")]
    PublicKeyMismatch,
}

/// Hash data using BLAKE2b-256
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derive an account address from an Ed25519 public key:
/// BLAKE2b-256(flag || pubkey)
pub fn derive_address(public_key: &[u8; 32]) -> Address {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    Address(hasher.finalize().into())
}

/// Ed25519 keypair that signs every transaction of a run
pub struct SignerKeypair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Clone for SignerKeypair {
    fn clone(&self) -> Self {
        Self::from_secret_bytes(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for SignerKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl SignerKeypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from raw secret key bytes
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Parse a hex-encoded secret key.
    ///
    /// Accepts 32 bytes of secret material, or the 64-byte `secret || public`
    /// export format, in which case the public half must match.
    pub fn from_hex(secret_hex: &str) -> Result<Self, KeyError> {
        let trimmed = secret_hex.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(KeyError::EmptySecretKey);
        }

        let bytes = hex::decode(trimmed).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        match bytes.len() {
            32 => {
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&bytes);
                Ok(Self::from_secret_bytes(&secret))
            }
            64 => {
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&bytes[..32]);
                let keypair = Self::from_secret_bytes(&secret);
                if keypair.public_key_bytes()[..] != bytes[32..] {
                    return Err(KeyError::PublicKeyMismatch);
                }
                Ok(keypair)
            }
            n => Err(KeyError::InvalidSecretKeyLength(n)),
        }
    }

    /// Get the public key as bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Get the secret key as bytes
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Account address controlled by this keypair
    pub fn address(&self) -> Address {
        derive_address(&self.public_key_bytes())
    }

    /// Export the secret as base64(flag || secret), the form carried in
    /// claim links
    pub fn export_secret(&self) -> String {
        let mut bytes = Vec::with_capacity(33);
        bytes.push(ED25519_FLAG);
        bytes.extend_from_slice(&self.secret_key_bytes());
        STANDARD.encode(bytes)
    }

    /// Import a secret exported by [`SignerKeypair::export_secret`]
    pub fn import_secret(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        match bytes.as_slice() {
            [ED25519_FLAG, rest @ ..] if rest.len() == 32 => {
                let mut secret = [0u8; 32];
                secret.copy_from_slice(rest);
                Ok(Self::from_secret_bytes(&secret))
            }
            [] => Err(KeyError::EmptySecretKey),
            _ => Err(KeyError::InvalidSecretKeyLength(bytes.len().saturating_sub(1))),
        }
    }

    /// Sign raw bytes
    pub fn sign(&self, data: &[u8]) -> [u8; 64] {
        let signature: Signature = self.signing_key.sign(data);
        signature.to_bytes()
    }
}
