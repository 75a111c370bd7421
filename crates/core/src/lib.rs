//! Linkdrop Core Types
//!
//! This crate defines the data model shared by every Linkdrop crate:
//! ledger identifiers, the assets being distributed, the coins that fund
//! them and the claim links produced for them.

mod error;
mod types;

pub use error::*;
pub use types::*;
