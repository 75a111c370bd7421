//! Ledger responses consumed by the distribution pipeline

use serde::{Deserialize, Serialize};

use linkdrop_core::{Address, ObjectId, ObjectRef};

/// One entry of an owned-objects listing.
///
/// The ledger may return an entry carrying only an error (for example an
/// object deleted between indexing and reading); `object` is then `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedObjectEntry {
    pub object: Option<ObjectRef>,
    pub object_type: Option<String>,
    pub error: Option<String>,
}

/// One page of an owned-objects listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedObjectsPage {
    pub data: Vec<OwnedObjectEntry>,
    pub has_next_page: bool,
    pub next_cursor: Option<String>,
}

/// A native-currency coin owned by an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinData {
    pub object: ObjectRef,
    pub balance: u64,
}

/// Execution status reported in transaction effects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failure { error: String },
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Success)
    }
}

/// Object-level change caused by an executed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectChange {
    Created {
        object: ObjectRef,
        object_type: String,
        owner: Option<Address>,
    },
    Mutated {
        object: ObjectRef,
        object_type: String,
        owner: Option<Address>,
    },
    Deleted {
        object_id: ObjectId,
    },
    /// Any change kind this tool does not act on (published, wrapped, ...)
    Other,
}

/// Result of submitting a signed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResponse {
    pub digest: String,
    pub status: ExecutionStatus,
    /// Object changes in the order the ledger reported them
    pub object_changes: Vec<ObjectChange>,
}

impl ExecutionResponse {
    /// Created objects, preserving creation order
    pub fn created(&self) -> Vec<ObjectRef> {
        self.object_changes
            .iter()
            .filter_map(|change| match change {
                ObjectChange::Created { object, .. } => Some(*object),
                _ => None,
            })
            .collect()
    }
}
