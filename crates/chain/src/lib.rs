//! Linkdrop Chain
//!
//! Ledger access for the distribution pipeline.
//!
//! ## Clients
//!
//! - **Live** ([`SuiRpcClient`]): full-node JSON-RPC over HTTP. Transactions
//!   are BCS-encoded and signed locally before submission.
//! - **Mock** ([`MockLedger`]): in-memory ledger that executes the same
//!   transactions, for development and tests.
//!
//! Both sit behind [`LedgerClient`], so the pipeline never knows which one
//! it is talking to.

mod client;
mod config;
mod mock;
mod protocol;
mod tx;
mod types;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use linkdrop_core::Address;
use linkdrop_crypto::SignerKeypair;

pub use client::SuiRpcClient;
pub use config::{ChainConfig, ChainMode, Network};
pub use mock::{MockLedger, MOCK_COMPUTATION_COST, MOCK_GAS_PRICE};
pub use protocol::method;
pub use tx::{
    Argument, CallArg, Command, GasData, ProgrammableTransaction, ProgrammableTransactionBuilder,
    TransactionData,
};
pub use types::*;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Signer {signer} cannot sign for sender {sender}")]
    SignerMismatch { signer: Address, sender: Address },
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// Ledger operations used by the distribution pipeline
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// One page of objects owned by `owner` whose type matches `type_filter`
    async fn list_owned_objects(
        &self,
        owner: Address,
        type_filter: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<OwnedObjectsPage>;

    /// All native-currency coins owned by `owner`
    async fn get_coins(&self, owner: Address) -> Result<Vec<CoinData>>;

    async fn reference_gas_price(&self) -> Result<u64>;

    /// Sign `tx` with `signer` and wait for its effects.
    ///
    /// `Ok` does not mean success: inspect [`ExecutionResponse::status`].
    async fn sign_and_execute(
        &self,
        tx: &TransactionData,
        signer: &SignerKeypair,
    ) -> Result<ExecutionResponse>;
}

/// Build the client selected by `config.mode`
pub fn connect(config: ChainConfig) -> Result<Arc<dyn LedgerClient>> {
    match config.mode {
        ChainMode::Mock => Ok(Arc::new(MockLedger::new())),
        ChainMode::Live => Ok(Arc::new(SuiRpcClient::new(config)?)),
    }
}
