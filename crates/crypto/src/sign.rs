use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::keys::{blake2b256, SignerKeypair, ED25519_FLAG};

/// Intent prefix for transaction data: (scope = TransactionData, version = V0, app = Sui)
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Length of a serialized signature: flag || signature || public key
pub const SERIALIZED_SIGNATURE_LEN: usize = 1 + 64 + 32;

/// Digest a signer actually signs: BLAKE2b-256(intent || tx_bytes)
pub fn transaction_signing_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut message = Vec::with_capacity(TRANSACTION_INTENT.len() + tx_bytes.len());
    message.extend_from_slice(&TRANSACTION_INTENT);
    message.extend_from_slice(tx_bytes);
    blake2b256(&message)
}

/// Signature in the ledger's wire form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSignature(pub [u8; SERIALIZED_SIGNATURE_LEN]);

impl UserSignature {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn public_key(&self) -> [u8; 32] {
        let mut pk = [0u8; 32];
        pk.copy_from_slice(&self.0[65..]);
        pk
    }
}

/// Sign BCS-encoded transaction data
pub fn sign_transaction(keypair: &SignerKeypair, tx_bytes: &[u8]) -> UserSignature {
    let digest = transaction_signing_digest(tx_bytes);
    let signature = keypair.sign(&digest);

    let mut out = [0u8; SERIALIZED_SIGNATURE_LEN];
    out[0] = ED25519_FLAG;
    out[1..65].copy_from_slice(&signature);
    out[65..].copy_from_slice(&keypair.public_key_bytes());
    UserSignature(out)
}

/// Verify a serialized signature over BCS-encoded transaction data
pub fn verify_transaction_signature(tx_bytes: &[u8], signature: &UserSignature) -> bool {
    if signature.0[0] != ED25519_FLAG {
        return false;
    }
    let verifying_key = match VerifyingKey::from_bytes(&signature.public_key()) {
        Ok(vk) => vk,
        Err(_) => return false,
    };

    let mut sig_bytes = [0u8; 64];
    sig_bytes.copy_from_slice(&signature.0[1..65]);
    let sig = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(&transaction_signing_digest(tx_bytes), &sig)
        .is_ok()
}
