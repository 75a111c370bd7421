//! JSON-RPC 2.0 protocol types and full-node response shapes

use serde::{Deserialize, Deserializer, Serialize};

use linkdrop_core::{Address, ObjectDigest, ObjectId, ObjectRef};

use crate::types::{
    CoinData, ExecutionResponse, ExecutionStatus, ObjectChange, OwnedObjectEntry, OwnedObjectsPage,
};

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: serde_json::Value,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Full-node method names
pub mod method {
    pub const GET_OWNED_OBJECTS: &str = "suix_getOwnedObjects";
    pub const GET_COINS: &str = "suix_getCoins";
    pub const GET_REFERENCE_GAS_PRICE: &str = "suix_getReferenceGasPrice";
    pub const EXECUTE_TRANSACTION_BLOCK: &str = "sui_executeTransactionBlock";
}

/// The node encodes u64 values as decimal strings; accept plain numbers too.
fn de_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Str(String),
        Num(u64),
    }

    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Str(s) => s.parse().map_err(serde::de::Error::custom),
        StrOrNum::Num(n) => Ok(n),
    }
}

/// Parse a `u64` result that the node returns as a string
pub fn parse_u64_result(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn owner_address(owner: &Option<serde_json::Value>) -> Option<Address> {
    owner
        .as_ref()?
        .get("AddressOwner")?
        .as_str()?
        .parse()
        .ok()
}

// =========================================================================
// suix_getOwnedObjects
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedObjectsResponse {
    pub data: Vec<ObjectResponse>,
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectResponse {
    pub data: Option<ObjectData>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub object_id: ObjectId,
    #[serde(deserialize_with = "de_u64")]
    pub version: u64,
    pub digest: ObjectDigest,
    #[serde(rename = "type")]
    pub object_type: Option<String>,
}

impl From<PaginatedObjectsResponse> for OwnedObjectsPage {
    fn from(raw: PaginatedObjectsResponse) -> Self {
        let data = raw
            .data
            .into_iter()
            .map(|entry| OwnedObjectEntry {
                object: entry
                    .data
                    .as_ref()
                    .map(|d| ObjectRef::new(d.object_id, d.version, d.digest)),
                object_type: entry.data.and_then(|d| d.object_type),
                error: entry.error.map(|e| e.to_string()),
            })
            .collect();
        OwnedObjectsPage {
            data,
            has_next_page: raw.has_next_page,
            next_cursor: raw.next_cursor,
        }
    }
}

// =========================================================================
// suix_getCoins
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedCoins {
    pub data: Vec<RawCoin>,
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCoin {
    pub coin_object_id: ObjectId,
    #[serde(deserialize_with = "de_u64")]
    pub version: u64,
    pub digest: ObjectDigest,
    #[serde(deserialize_with = "de_u64")]
    pub balance: u64,
}

impl From<RawCoin> for CoinData {
    fn from(raw: RawCoin) -> Self {
        CoinData {
            object: ObjectRef::new(raw.coin_object_id, raw.version, raw.digest),
            balance: raw.balance,
        }
    }
}

// =========================================================================
// sui_executeTransactionBlock
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockResponse {
    pub digest: String,
    pub effects: Option<RawEffects>,
    pub object_changes: Option<Vec<RawObjectChange>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEffects {
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RawObjectChange {
    Created {
        object_id: ObjectId,
        #[serde(deserialize_with = "de_u64")]
        version: u64,
        digest: ObjectDigest,
        object_type: String,
        owner: Option<serde_json::Value>,
    },
    Mutated {
        object_id: ObjectId,
        #[serde(deserialize_with = "de_u64")]
        version: u64,
        digest: ObjectDigest,
        object_type: String,
        owner: Option<serde_json::Value>,
    },
    Deleted {
        object_id: ObjectId,
    },
    #[serde(other)]
    Other,
}

impl From<RawObjectChange> for ObjectChange {
    fn from(raw: RawObjectChange) -> Self {
        match raw {
            RawObjectChange::Created { object_id, version, digest, object_type, owner } => {
                ObjectChange::Created {
                    object: ObjectRef::new(object_id, version, digest),
                    object_type,
                    owner: owner_address(&owner),
                }
            }
            RawObjectChange::Mutated { object_id, version, digest, object_type, owner } => {
                ObjectChange::Mutated {
                    object: ObjectRef::new(object_id, version, digest),
                    object_type,
                    owner: owner_address(&owner),
                }
            }
            RawObjectChange::Deleted { object_id } => ObjectChange::Deleted { object_id },
            RawObjectChange::Other => ObjectChange::Other,
        }
    }
}

impl TransactionBlockResponse {
    /// A response without effects cannot be trusted as a success
    pub fn into_execution_response(self) -> ExecutionResponse {
        let status = self.effects.map(|e| e.status).unwrap_or(ExecutionStatus::Failure {
            error: "response carried no effects".to_string(),
        });
        ExecutionResponse {
            digest: self.digest,
            status,
            object_changes: self
                .object_changes
                .unwrap_or_default()
                .into_iter()
                .map(ObjectChange::from)
                .collect(),
        }
    }
}
