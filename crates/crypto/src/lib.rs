//! Linkdrop Cryptography
//!
//! Ed25519 signer identities, address derivation and transaction signing
//! with the ledger's intent-prefixed BLAKE2b scheme.

mod keys;
mod sign;

pub use keys::*;
pub use sign::*;
