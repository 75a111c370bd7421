//! Live full-node client
//!
//! Speaks JSON-RPC 2.0 over HTTP. Transactions are BCS-encoded and signed
//! locally; the node only ever sees signed bytes.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use linkdrop_core::{Address, SUI_TYPE};
use linkdrop_crypto::{sign_transaction, SignerKeypair};

use crate::protocol::{
    method, parse_u64_result, PaginatedCoins, PaginatedObjectsResponse, RpcRequest, RpcResponse,
    TransactionBlockResponse,
};
use crate::tx::TransactionData;
use crate::types::{CoinData, ExecutionResponse, OwnedObjectsPage};
use crate::{ChainConfig, ChainError, LedgerClient, Result};

/// Page size used when draining coin listings
const COIN_PAGE_SIZE: usize = 50;

/// Full-node JSON-RPC client
pub struct SuiRpcClient {
    config: ChainConfig,
    http: reqwest::Client,
    request_id: AtomicU64,
}

impl SuiRpcClient {
    /// Create a new client. Does not contact the node.
    pub fn new(config: ChainConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.config.rpc_url
    }

    /// Get the next request ID
    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Send a raw JSON-RPC request
    pub async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let request = RpcRequest::new(method, params, self.next_id());
        debug!("-> {} (id {})", request.method, request.id);

        let response = self
            .http
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Transport(format!("{} returned HTTP {}", method, status)));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        debug!("<- {} (id {})", method, response.id);

        if let Some(error) = response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }

    /// Send a request and decode its result
    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let result = self.send_request(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("{}: {}", method, e)))
    }
}

#[async_trait]
impl LedgerClient for SuiRpcClient {
    async fn list_owned_objects(
        &self,
        owner: Address,
        type_filter: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<OwnedObjectsPage> {
        let query = json!({
            "filter": { "StructType": type_filter },
            "options": { "showType": true },
        });
        let raw: PaginatedObjectsResponse = self
            .call(
                method::GET_OWNED_OBJECTS,
                json!([owner.to_string(), query, cursor, limit]),
            )
            .await?;
        Ok(raw.into())
    }

    async fn get_coins(&self, owner: Address) -> Result<Vec<CoinData>> {
        let mut coins = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page: PaginatedCoins = self
                .call(
                    method::GET_COINS,
                    json!([owner.to_string(), SUI_TYPE, cursor, COIN_PAGE_SIZE]),
                )
                .await?;
            coins.extend(page.data.into_iter().map(CoinData::from));
            if !page.has_next_page || page.next_cursor.is_none() {
                break;
            }
            cursor = page.next_cursor;
        }
        Ok(coins)
    }

    async fn reference_gas_price(&self) -> Result<u64> {
        let result = self
            .send_request(method::GET_REFERENCE_GAS_PRICE, json!([]))
            .await?;
        parse_u64_result(&result).ok_or_else(|| {
            ChainError::InvalidResponse(format!("reference gas price: {}", result))
        })
    }

    async fn sign_and_execute(
        &self,
        tx: &TransactionData,
        signer: &SignerKeypair,
    ) -> Result<ExecutionResponse> {
        let signer_address = signer.address();
        if signer_address != tx.sender {
            return Err(ChainError::SignerMismatch {
                signer: signer_address,
                sender: tx.sender,
            });
        }

        let tx_bytes = tx.to_bcs();
        let signature = sign_transaction(signer, &tx_bytes);
        let options = json!({ "showEffects": true, "showObjectChanges": true });

        let raw: TransactionBlockResponse = self
            .call(
                method::EXECUTE_TRANSACTION_BLOCK,
                json!([
                    STANDARD.encode(&tx_bytes),
                    [signature.to_base64()],
                    options,
                    "WaitForLocalExecution",
                ]),
            )
            .await?;

        let response = raw.into_execution_response();
        info!("Transaction {} executed: {:?}", response.digest, response.status);
        Ok(response)
    }
}
