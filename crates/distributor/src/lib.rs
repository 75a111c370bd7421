//! Linkdrop Distributor
//!
//! Batch pipeline turning owned assets into funded claim links.
//!
//! ## Pipeline
//!
//! 1. **Discover**: page through the signer's objects of the configured type,
//!    up to the limit.
//! 2. **Allocate**: one transaction splits the signer's balance into exactly
//!    one coin of `gas_budget + tip` per asset.
//! 3. **Pair**: assets and funding coins are matched into an explicit table;
//!    unequal counts abort the run.
//! 4. **Claim**: every pair is sent to its own claim address through a
//!    bounded worker pool. Each pair ends as a link or a recorded failure;
//!    no single failure aborts the batch.

mod allocator;
mod config;
mod discovery;
mod factory;
mod orchestrator;
mod pairing;

pub use allocator::{allocate_funding, build_funding_transaction, FundingRequest};
pub use config::{
    DistributionConfig, DEFAULT_CONCURRENCY, DEFAULT_FUNDING_GAS_BUDGET, DEFAULT_GAS_BUDGET,
    DEFAULT_LIMIT, MAX_LIMIT,
};
pub use discovery::{discover_assets, MAX_PAGE_SIZE};
pub use factory::LinkFactory;
pub use orchestrator::{claim_all, DistributionReport, Distributor, RunEvent};
pub use pairing::{FundingEntry, FundingTable};

use linkdrop_chain::ChainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DistributorError {
    #[error("Discovery failed: {0}")]
    Discovery(#[source] ChainError),

    #[error("Funding failed: {0}")]
    FundingFailed(String),

    #[error("Limit {limit} exceeds the maximum of {max} assets per run")]
    LimitTooLarge { limit: usize, max: usize },

    #[error("Pairing mismatch: {assets} assets but {coins} funding coins")]
    PairingMismatch { assets: usize, coins: usize },

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
}

pub type Result<T> = std::result::Result<T, DistributorError>;
