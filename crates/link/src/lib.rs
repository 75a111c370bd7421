//! Linkdrop Claim Links
//!
//! A claim link carries a fresh ephemeral credential. The send transaction
//! moves the bundled assets (and an optional native-currency tip) to the
//! credential's address; whoever holds the link holds the key.
//!
//! Link format: `{host}{path}#{secret}` where `secret` is
//! base64(`0x00` flag || 32-byte Ed25519 secret).

mod builder;

pub use builder::{ClaimLinkBuilder, LinkOptions, ParsedLink, DEFAULT_LINK_HOST, DEFAULT_LINK_PATH};

use linkdrop_crypto::KeyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Claim bundle is empty")]
    EmptyBundle,

    #[error("Claim bundle holds no object")]
    NoClaimableObject,

    #[error("Malformed claim link: {0}")]
    MalformedLink(String),

    #[error("Invalid link secret: {0}")]
    InvalidSecret(#[from] KeyError),
}

pub type Result<T> = std::result::Result<T, LinkError>;
