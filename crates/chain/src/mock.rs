//! In-memory ledger for development and tests
//!
//! Interprets the same [`TransactionData`] the live client submits:
//! gas payment smashing, `SplitCoins`, `TransferObjects`, version bumps and
//! created-object reporting in creation order. Failed transactions still pay
//! for gas and leave every other object untouched.
//!
//! Faults can be injected per object to exercise partial-failure handling.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, info};

use linkdrop_core::{Address, ObjectDigest, ObjectId, ObjectRef, SUI_COIN_TYPE};
use linkdrop_crypto::{blake2b256, sign_transaction, verify_transaction_signature, SignerKeypair};

use crate::tx::{Argument, CallArg, Command, ProgrammableTransaction, TransactionData};
use crate::types::{
    CoinData, ExecutionResponse, ExecutionStatus, ObjectChange, OwnedObjectEntry, OwnedObjectsPage,
};
use crate::{ChainError, LedgerClient, Result};

/// Gas charged for every executed transaction, in MIST
pub const MOCK_COMPUTATION_COST: u64 = 1_000_000;

/// Reference gas price reported by the mock
pub const MOCK_GAS_PRICE: u64 = 750;

#[derive(Debug, Clone)]
struct MockObject {
    id: ObjectId,
    version: u64,
    digest: ObjectDigest,
    owner: Address,
    object_type: String,
    /// `Some` for coins
    balance: Option<u64>,
    /// Listing order
    seq: u64,
    /// Unreadable objects are listed as error entries without data
    readable: bool,
}

impl MockObject {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.id, self.version, self.digest)
    }
}

/// In-memory state for mock mode
#[derive(Debug)]
struct MockState {
    objects: HashMap<ObjectId, MockObject>,
    next_seq: u64,
    mint_counter: u64,
    computation_cost: u64,
    gas_price: u64,
    /// Number of listing requests served (including failed ones)
    list_calls: usize,
    /// Listing requests beyond this count fail
    fail_listing_after: Option<usize>,
    /// Transactions touching these objects execute with a failure status
    failing_objects: HashSet<ObjectId>,
    /// Transactions touching these objects error before execution
    erroring_objects: HashSet<ObjectId>,
    /// Digests of every transaction that reached execution
    executed: Vec<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            next_seq: 0,
            mint_counter: 0,
            computation_cost: MOCK_COMPUTATION_COST,
            gas_price: MOCK_GAS_PRICE,
            list_calls: 0,
            fail_listing_after: None,
            failing_objects: HashSet::new(),
            erroring_objects: HashSet::new(),
            executed: Vec::new(),
        }
    }
}

fn derive_digest(id: &ObjectId, version: u64) -> ObjectDigest {
    let mut data = Vec::with_capacity(40);
    data.extend_from_slice(id.as_bytes());
    data.extend_from_slice(&version.to_le_bytes());
    ObjectDigest(blake2b256(&data))
}

/// Id of the `index`-th object created by a transaction
fn derive_created_id(tx_digest: &str, index: usize) -> ObjectId {
    let mut data = tx_digest.as_bytes().to_vec();
    data.extend_from_slice(&(index as u64).to_le_bytes());
    ObjectId(blake2b256(&data))
}

/// `type_filter` matches the exact type, or any instantiation of a generic
/// type given without type parameters
fn type_matches(object_type: &str, type_filter: &str) -> bool {
    object_type == type_filter
        || (!type_filter.contains('<')
            && object_type.starts_with(type_filter)
            && object_type[type_filter.len()..].starts_with('<'))
}

/// In-memory ledger implementing [`LedgerClient`]
#[derive(Debug, Clone, Default)]
pub struct MockLedger {
    state: Arc<RwLock<MockState>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Seeding ====================

    fn mint(&self, owner: Address, object_type: &str, balance: Option<u64>, readable: bool) -> ObjectRef {
        let mut state = self.state.write().expect("mock ledger lock poisoned");
        state.mint_counter += 1;

        let mut seed = b"mock-mint".to_vec();
        seed.extend_from_slice(&state.mint_counter.to_le_bytes());
        let id = ObjectId(blake2b256(&seed));
        let seq = state.next_seq;
        state.next_seq += 1;

        let object = MockObject {
            id,
            version: 1,
            digest: derive_digest(&id, 1),
            owner,
            object_type: object_type.to_string(),
            balance,
            seq,
            readable,
        };
        let object_ref = object.object_ref();
        state.objects.insert(id, object);
        object_ref
    }

    /// Create a native coin owned by `owner`
    pub fn mint_coin(&self, owner: Address, value: u64) -> ObjectRef {
        self.mint(owner, SUI_COIN_TYPE, Some(value), true)
    }

    /// Create a non-coin object owned by `owner`
    pub fn mint_object(&self, owner: Address, object_type: &str) -> ObjectRef {
        self.mint(owner, object_type, None, true)
    }

    /// Create an object that owner listings return without data
    pub fn mint_unreadable_object(&self, owner: Address, object_type: &str) -> ObjectRef {
        self.mint(owner, object_type, None, false)
    }

    // ==================== Fault injection ====================

    /// Listing requests beyond the first `calls` fail with a transport error
    pub fn fail_listing_after(&self, calls: usize) {
        self.state.write().expect("mock ledger lock poisoned").fail_listing_after = Some(calls);
    }

    /// Transactions using `object_id` as an input execute with failure status
    pub fn fail_execution_for(&self, object_id: ObjectId) {
        self.state
            .write()
            .expect("mock ledger lock poisoned")
            .failing_objects
            .insert(object_id);
    }

    /// Transactions using `object_id` as an input fail to submit
    pub fn error_submission_for(&self, object_id: ObjectId) {
        self.state
            .write()
            .expect("mock ledger lock poisoned")
            .erroring_objects
            .insert(object_id);
    }

    pub fn set_computation_cost(&self, cost: u64) {
        self.state.write().expect("mock ledger lock poisoned").computation_cost = cost;
    }

    // ==================== Inspection ====================

    pub fn list_calls(&self) -> usize {
        self.state.read().expect("mock ledger lock poisoned").list_calls
    }

    /// Number of transactions that reached execution (success or failure)
    pub fn executed_transactions(&self) -> usize {
        self.state.read().expect("mock ledger lock poisoned").executed.len()
    }

    pub fn owner_of(&self, object_id: &ObjectId) -> Option<Address> {
        let state = self.state.read().expect("mock ledger lock poisoned");
        state.objects.get(object_id).map(|o| o.owner)
    }

    pub fn coin_balance(&self, object_id: &ObjectId) -> Option<u64> {
        let state = self.state.read().expect("mock ledger lock poisoned");
        state.objects.get(object_id).and_then(|o| o.balance)
    }

    /// Total native-currency balance of `owner`
    pub fn balance_of(&self, owner: Address) -> u64 {
        let state = self.state.read().expect("mock ledger lock poisoned");
        state
            .objects
            .values()
            .filter(|o| o.owner == owner)
            .filter_map(|o| o.balance)
            .sum()
    }

    /// Objects of `owner` matching `type_filter`, in listing order
    pub fn objects_owned_by(&self, owner: Address, type_filter: &str) -> Vec<ObjectRef> {
        let state = self.state.read().expect("mock ledger lock poisoned");
        Self::owned_sorted(&state, owner, type_filter)
            .into_iter()
            .map(|o| o.object_ref())
            .collect()
    }

    fn owned_sorted<'a>(state: &'a MockState, owner: Address, type_filter: &str) -> Vec<&'a MockObject> {
        let mut owned: Vec<&MockObject> = state
            .objects
            .values()
            .filter(|o| o.owner == owner && type_matches(&o.object_type, type_filter))
            .collect();
        owned.sort_by_key(|o| o.seq);
        owned
    }

    // ==================== Execution ====================

    /// Reject transactions the node would refuse before execution
    fn check_inputs(state: &MockState, tx: &TransactionData) -> Result<()> {
        if tx.gas_data.payment.is_empty() {
            return Err(ChainError::Rejected("no gas payment".to_string()));
        }
        if tx.gas_data.price < state.gas_price {
            return Err(ChainError::Rejected(format!(
                "gas price {} below reference {}",
                tx.gas_data.price, state.gas_price
            )));
        }

        let mut gas_balance: u64 = 0;
        for coin in &tx.gas_data.payment {
            let obj = state
                .objects
                .get(&coin.object_id)
                .ok_or_else(|| ChainError::Rejected(format!("gas coin {} not found", coin.object_id)))?;
            if obj.version != coin.version || obj.owner != tx.gas_data.owner {
                return Err(ChainError::Rejected(format!(
                    "gas coin {} is stale or not owned by gas owner",
                    coin.object_id
                )));
            }
            let balance = obj
                .balance
                .ok_or_else(|| ChainError::Rejected(format!("gas object {} is not a coin", coin.object_id)))?;
            gas_balance = gas_balance.saturating_add(balance);
        }
        if gas_balance < tx.gas_data.budget {
            return Err(ChainError::Rejected(format!(
                "gas balance {} below budget {}",
                gas_balance, tx.gas_data.budget
            )));
        }

        for input in tx.kind.object_inputs() {
            let obj = state
                .objects
                .get(&input.object_id)
                .ok_or_else(|| ChainError::Rejected(format!("object {} not found", input.object_id)))?;
            if obj.version != input.version || obj.owner != tx.sender {
                return Err(ChainError::Rejected(format!(
                    "object {} is stale or not owned by sender",
                    input.object_id
                )));
            }
            if tx.gas_data.payment.iter().any(|c| c.object_id == input.object_id) {
                return Err(ChainError::Rejected(format!(
                    "object {} used as both gas and input",
                    input.object_id
                )));
            }
        }
        Ok(())
    }

    fn execute(state: &mut MockState, tx: &TransactionData) -> Result<ExecutionResponse> {
        Self::check_inputs(state, tx)?;

        let digest = tx.digest();
        state.executed.push(digest.clone());

        let gas_id = tx.gas_data.payment[0].object_id;
        let mut changes = Vec::new();

        // Smash all payment coins into the first one
        let mut smashed = 0u64;
        for coin in &tx.gas_data.payment[1..] {
            if let Some(obj) = state.objects.remove(&coin.object_id) {
                smashed = smashed.saturating_add(obj.balance.unwrap_or(0));
                changes.push(ObjectChange::Deleted { object_id: coin.object_id });
            }
        }
        if let Some(gas) = state.objects.get_mut(&gas_id) {
            gas.balance = Some(gas.balance.unwrap_or(0).saturating_add(smashed));
        }

        let lamport = tx
            .gas_data
            .payment
            .iter()
            .map(|c| c.version)
            .chain(tx.kind.object_inputs().map(|o| o.version))
            .max()
            .unwrap_or(0)
            + 1;

        let injected = tx
            .kind
            .object_inputs()
            .any(|o| state.failing_objects.contains(&o.object_id));

        let mut scratch = state.objects.clone();
        let outcome = if injected {
            Err("MoveAbort: injected execution failure".to_string())
        } else if state.computation_cost > tx.gas_data.budget {
            Err("InsufficientGas".to_string())
        } else {
            run_commands(&mut scratch, tx, gas_id, &digest)
        };

        let status = match outcome {
            Ok((created, transferred)) => {
                for (i, id) in created.iter().enumerate() {
                    if let Some(obj) = scratch.get_mut(id) {
                        obj.seq = state.next_seq + i as u64;
                    }
                }
                state.next_seq += created.len() as u64;
                state.objects = scratch;

                for id in &transferred {
                    if let Some(obj) = state.objects.get_mut(id) {
                        obj.version = lamport;
                        obj.digest = derive_digest(id, lamport);
                        changes.push(ObjectChange::Mutated {
                            object: obj.object_ref(),
                            object_type: obj.object_type.clone(),
                            owner: Some(obj.owner),
                        });
                    }
                }
                for id in &created {
                    if let Some(obj) = state.objects.get_mut(id) {
                        obj.version = lamport;
                        obj.digest = derive_digest(id, lamport);
                        changes.push(ObjectChange::Created {
                            object: obj.object_ref(),
                            object_type: obj.object_type.clone(),
                            owner: Some(obj.owner),
                        });
                    }
                }
                ExecutionStatus::Success
            }
            Err(error) => {
                debug!("[MOCK] Transaction {} failed: {}", digest, error);
                ExecutionStatus::Failure { error }
            }
        };

        // Gas is charged whether or not execution succeeded
        let charge = state.computation_cost.min(tx.gas_data.budget);
        if let Some(gas) = state.objects.get_mut(&gas_id) {
            gas.balance = Some(gas.balance.unwrap_or(0).saturating_sub(charge));
            gas.version = lamport;
            gas.digest = derive_digest(&gas_id, lamport);
            changes.insert(
                0,
                ObjectChange::Mutated {
                    object: gas.object_ref(),
                    object_type: gas.object_type.clone(),
                    owner: Some(gas.owner),
                },
            );
        }

        info!("[MOCK] Transaction {} executed: {:?}", digest, status);
        Ok(ExecutionResponse {
            digest,
            status,
            object_changes: changes,
        })
    }
}

fn input_at(pt: &ProgrammableTransaction, index: u16) -> std::result::Result<&CallArg, String> {
    pt.inputs
        .get(index as usize)
        .ok_or_else(|| format!("input {} out of bounds", index))
}

fn resolve_object(
    arg: Argument,
    pt: &ProgrammableTransaction,
    results: &[Vec<ObjectId>],
    gas_id: ObjectId,
) -> std::result::Result<ObjectId, String> {
    match arg {
        Argument::GasCoin => Ok(gas_id),
        Argument::Input(i) => match input_at(pt, i)? {
            CallArg::Object(obj) => Ok(obj.object_id),
            CallArg::Pure(_) => Err(format!("input {} is not an object", i)),
        },
        Argument::Result(i) => match results.get(i as usize).map(Vec::as_slice) {
            Some([single]) => Ok(*single),
            _ => Err(format!("result {} is not a single object", i)),
        },
        Argument::NestedResult(i, j) => results
            .get(i as usize)
            .and_then(|r| r.get(j as usize))
            .copied()
            .ok_or_else(|| format!("nested result ({}, {}) out of bounds", i, j)),
    }
}

fn resolve_pure<'a>(arg: Argument, pt: &'a ProgrammableTransaction) -> std::result::Result<&'a [u8], String> {
    match arg {
        Argument::Input(i) => match input_at(pt, i)? {
            CallArg::Pure(bytes) => Ok(bytes.as_slice()),
            CallArg::Object(_) => Err(format!("input {} is not a pure value", i)),
        },
        other => Err(format!("{:?} is not a pure value", other)),
    }
}

fn resolve_u64(arg: Argument, pt: &ProgrammableTransaction) -> std::result::Result<u64, String> {
    let bytes: [u8; 8] = resolve_pure(arg, pt)?
        .try_into()
        .map_err(|_| "pure value is not a u64".to_string())?;
    Ok(u64::from_le_bytes(bytes))
}

fn resolve_address(arg: Argument, pt: &ProgrammableTransaction) -> std::result::Result<Address, String> {
    let bytes: [u8; 32] = resolve_pure(arg, pt)?
        .try_into()
        .map_err(|_| "pure value is not an address".to_string())?;
    Ok(Address(bytes))
}

/// Run the commands against `objects`. Returns created ids in creation order
/// and the pre-existing objects that changed owner.
fn run_commands(
    objects: &mut HashMap<ObjectId, MockObject>,
    tx: &TransactionData,
    gas_id: ObjectId,
    tx_digest: &str,
) -> std::result::Result<(Vec<ObjectId>, Vec<ObjectId>), String> {
    let pt = &tx.kind;
    let mut results: Vec<Vec<ObjectId>> = Vec::with_capacity(pt.commands.len());
    let mut created: Vec<ObjectId> = Vec::new();
    let mut transferred: Vec<ObjectId> = Vec::new();

    for (index, command) in pt.commands.iter().enumerate() {
        match command {
            Command::SplitCoins(coin, amounts) => {
                let coin_id = resolve_object(*coin, pt, &results, gas_id)?;
                let values = amounts
                    .iter()
                    .map(|a| resolve_u64(*a, pt))
                    .collect::<std::result::Result<Vec<u64>, String>>()?;
                let total = values
                    .iter()
                    .try_fold(0u64, |acc, v| acc.checked_add(*v))
                    .ok_or_else(|| format!("ArithmeticOverflow in command {}", index))?;

                // The gas budget stays reserved while the gas coin is in use
                let reserved = if coin_id == gas_id { tx.gas_data.budget } else { 0 };
                let coin_obj = objects
                    .get_mut(&coin_id)
                    .ok_or_else(|| format!("object {} not available", coin_id))?;
                let balance = coin_obj
                    .balance
                    .ok_or_else(|| format!("object {} is not a coin", coin_id))?;
                if balance.saturating_sub(reserved) < total {
                    return Err(format!("InsufficientCoinBalance in command {}", index));
                }
                coin_obj.balance = Some(balance - total);

                let mut new_coins = Vec::with_capacity(values.len());
                for value in values {
                    let id = derive_created_id(tx_digest, created.len());
                    objects.insert(
                        id,
                        MockObject {
                            id,
                            version: 0,
                            digest: derive_digest(&id, 0),
                            owner: tx.sender,
                            object_type: SUI_COIN_TYPE.to_string(),
                            balance: Some(value),
                            seq: 0,
                            readable: true,
                        },
                    );
                    created.push(id);
                    new_coins.push(id);
                }
                results.push(new_coins);
            }
            Command::TransferObjects(targets, recipient) => {
                let recipient = resolve_address(*recipient, pt)?;
                for arg in targets {
                    let id = resolve_object(*arg, pt, &results, gas_id)?;
                    if id == gas_id {
                        return Err("the gas coin cannot be transferred".to_string());
                    }
                    let obj = objects
                        .get_mut(&id)
                        .ok_or_else(|| format!("object {} not available", id))?;
                    obj.owner = recipient;
                    if !created.contains(&id) && !transferred.contains(&id) {
                        transferred.push(id);
                    }
                }
                results.push(Vec::new());
            }
        }
    }

    Ok((created, transferred))
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn list_owned_objects(
        &self,
        owner: Address,
        type_filter: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<OwnedObjectsPage> {
        let mut state = self.state.write().expect("mock ledger lock poisoned");
        state.list_calls += 1;
        if let Some(allowed) = state.fail_listing_after {
            if state.list_calls > allowed {
                return Err(ChainError::Transport("injected listing failure".to_string()));
            }
        }

        let owned = Self::owned_sorted(&state, owner, type_filter);
        let start = match cursor {
            Some(cursor) => {
                let cursor_id: ObjectId = cursor
                    .parse()
                    .map_err(|_| ChainError::Rpc { code: -32602, message: format!("invalid cursor {}", cursor) })?;
                owned
                    .iter()
                    .position(|o| o.id == cursor_id)
                    .map(|p| p + 1)
                    .unwrap_or(owned.len())
            }
            None => 0,
        };

        let end = (start + limit).min(owned.len());
        let page = &owned[start..end];
        let data = page
            .iter()
            .map(|o| {
                if o.readable {
                    OwnedObjectEntry {
                        object: Some(o.object_ref()),
                        object_type: Some(o.object_type.clone()),
                        error: None,
                    }
                } else {
                    OwnedObjectEntry {
                        object: None,
                        object_type: None,
                        error: Some(format!("object {} could not be read", o.id)),
                    }
                }
            })
            .collect();

        Ok(OwnedObjectsPage {
            data,
            has_next_page: end < owned.len(),
            next_cursor: page.last().map(|o| o.id.to_string()),
        })
    }

    async fn get_coins(&self, owner: Address) -> Result<Vec<CoinData>> {
        let state = self.state.read().expect("mock ledger lock poisoned");
        Ok(Self::owned_sorted(&state, owner, SUI_COIN_TYPE)
            .into_iter()
            .map(|o| CoinData {
                object: o.object_ref(),
                balance: o.balance.unwrap_or(0),
            })
            .collect())
    }

    async fn reference_gas_price(&self) -> Result<u64> {
        Ok(self.state.read().expect("mock ledger lock poisoned").gas_price)
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
        if !verify_transaction_signature(&tx_bytes, &signature) {
            return Err(ChainError::Rejected("invalid signature".to_string()));
        }

        let mut state = self.state.write().expect("mock ledger lock poisoned");
        if tx
            .kind
            .object_inputs()
            .any(|o| state.erroring_objects.contains(&o.object_id))
        {
            return Err(ChainError::Transport("injected submission failure".to_string()));
        }

        Self::execute(&mut state, tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::ProgrammableTransactionBuilder;

    const NFT: &str = "0xabc::nft::Nft";

    fn split_tx(sender: Address, gas: ObjectRef, amounts: &[u64], budget: u64) -> TransactionData {
        let mut ptb = ProgrammableTransactionBuilder::new();
        let args = amounts.iter().map(|a| ptb.pure_u64(*a)).collect();
        let coins = ptb.split_coins(Argument::GasCoin, args);
        let recipient = ptb.pure_address(sender);
        ptb.transfer_objects(coins, recipient);
        TransactionData::new_programmable(sender, vec![gas], ptb.finish(), budget, MOCK_GAS_PRICE)
    }

    #[test]
    fn test_type_matches() {
        assert!(type_matches("0x2::coin::Coin<0x2::sui::SUI>", "0x2::coin::Coin"));
        assert!(type_matches("0x2::coin::Coin<0x2::sui::SUI>", "0x2::coin::Coin<0x2::sui::SUI>"));
        assert!(!type_matches("0x2::coin::CoinMetadata<0x2::sui::SUI>", "0x2::coin::Coin"));
        assert!(!type_matches("0xabc::nft::Nft", "0x2::coin::Coin"));
    }

    #[tokio::test]
    async fn test_listing_pages() {
        let ledger = MockLedger::new();
        let owner = Address([1u8; 32]);
        for _ in 0..5 {
            ledger.mint_object(owner, NFT);
        }
        ledger.mint_object(owner, "0xabc::other::Thing");
        ledger.mint_object(Address([2u8; 32]), NFT);

        let first = ledger.list_owned_objects(owner, NFT, None, 3).await.unwrap();
        assert_eq!(first.data.len(), 3);
        assert!(first.has_next_page);

        let second = ledger
            .list_owned_objects(owner, NFT, first.next_cursor.clone(), 3)
            .await
            .unwrap();
        assert_eq!(second.data.len(), 2);
        assert!(!second.has_next_page);
        assert_eq!(ledger.list_calls(), 2);

        let all: Vec<_> = first.data.iter().chain(second.data.iter()).map(|e| e.object.unwrap()).collect();
        assert_eq!(all, ledger.objects_owned_by(owner, NFT));
    }

    #[tokio::test]
    async fn test_unreadable_object_listed_without_data() {
        let ledger = MockLedger::new();
        let owner = Address([1u8; 32]);
        ledger.mint_unreadable_object(owner, NFT);

        let page = ledger.list_owned_objects(owner, NFT, None, 50).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.data[0].object.is_none());
        assert!(page.data[0].error.is_some());
    }

    #[tokio::test]
    async fn test_listing_failure_injection() {
        let ledger = MockLedger::new();
        let owner = Address([1u8; 32]);
        ledger.fail_listing_after(1);

        assert!(ledger.list_owned_objects(owner, NFT, None, 5).await.is_ok());
        assert!(matches!(
            ledger.list_owned_objects(owner, NFT, None, 5).await,
            Err(ChainError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_split_and_transfer() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let owner = signer.address();
        let gas = ledger.mint_coin(owner, 10_000_000);

        let tx = split_tx(owner, gas, &[1_000, 1_000, 1_000], 2_000_000);
        let response = ledger.sign_and_execute(&tx, &signer).await.unwrap();

        assert!(response.status.is_success());
        let created = response.created();
        assert_eq!(created.len(), 3);
        for coin in &created {
            assert_eq!(ledger.coin_balance(&coin.object_id), Some(1_000));
            assert_eq!(ledger.owner_of(&coin.object_id), Some(owner));
        }
        // 3_000 split off, gas cost paid
        assert_eq!(ledger.coin_balance(&gas.object_id), Some(10_000_000 - 3_000 - MOCK_COMPUTATION_COST));
        assert_eq!(ledger.balance_of(owner), 10_000_000 - MOCK_COMPUTATION_COST);
        assert_eq!(ledger.executed_transactions(), 1);
    }

    #[tokio::test]
    async fn test_split_beyond_balance_fails_and_charges_gas() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let owner = signer.address();
        let gas = ledger.mint_coin(owner, 3_000_000);

        let tx = split_tx(owner, gas, &[2_000_000], 2_000_000);
        let response = ledger.sign_and_execute(&tx, &signer).await.unwrap();

        assert!(matches!(response.status, ExecutionStatus::Failure { .. }));
        assert!(response.created().is_empty());
        assert_eq!(ledger.balance_of(owner), 3_000_000 - MOCK_COMPUTATION_COST);
    }

    #[tokio::test]
    async fn test_gas_balance_below_budget_is_rejected() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let owner = signer.address();
        let gas = ledger.mint_coin(owner, 100);

        let tx = split_tx(owner, gas, &[1], 2_000_000);
        let err = ledger.sign_and_execute(&tx, &signer).await.unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));
        assert_eq!(ledger.executed_transactions(), 0);
    }

    #[tokio::test]
    async fn test_stale_object_is_rejected() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let owner = signer.address();
        let gas = ledger.mint_coin(owner, 10_000_000);

        let tx = split_tx(owner, gas, &[1], 2_000_000);
        ledger.sign_and_execute(&tx, &signer).await.unwrap();

        // Same gas ref again: its version moved on
        let err = ledger.sign_and_execute(&tx, &signer).await.unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_transfer_object_and_injected_failure() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let owner = signer.address();
        let recipient = Address([7u8; 32]);
        let asset = ledger.mint_object(owner, NFT);
        let other = ledger.mint_object(owner, NFT);
        let gas1 = ledger.mint_coin(owner, 5_000_000);
        let gas2 = ledger.mint_coin(owner, 5_000_000);

        ledger.fail_execution_for(other.object_id);

        let build = |obj: ObjectRef, gas: ObjectRef| {
            let mut ptb = ProgrammableTransactionBuilder::new();
            let a = ptb.object(obj);
            let r = ptb.pure_address(recipient);
            ptb.transfer_objects(vec![a], r);
            TransactionData::new_programmable(owner, vec![gas], ptb.finish(), 2_000_000, MOCK_GAS_PRICE)
        };

        let ok = ledger.sign_and_execute(&build(asset, gas1), &signer).await.unwrap();
        assert!(ok.status.is_success());
        assert_eq!(ledger.owner_of(&asset.object_id), Some(recipient));

        let failed = ledger.sign_and_execute(&build(other, gas2), &signer).await.unwrap();
        assert!(!failed.status.is_success());
        assert_eq!(ledger.owner_of(&other.object_id), Some(owner));
        assert_eq!(ledger.coin_balance(&gas2.object_id), Some(5_000_000 - MOCK_COMPUTATION_COST));
    }

    #[tokio::test]
    async fn test_submission_error_injection() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let owner = signer.address();
        let asset = ledger.mint_object(owner, NFT);
        let gas = ledger.mint_coin(owner, 5_000_000);
        ledger.error_submission_for(asset.object_id);

        let mut ptb = ProgrammableTransactionBuilder::new();
        let a = ptb.object(asset);
        let r = ptb.pure_address(Address([7u8; 32]));
        ptb.transfer_objects(vec![a], r);
        let tx = TransactionData::new_programmable(owner, vec![gas], ptb.finish(), 2_000_000, MOCK_GAS_PRICE);

        assert!(matches!(
            ledger.sign_and_execute(&tx, &signer).await,
            Err(ChainError::Transport(_))
        ));
        assert_eq!(ledger.executed_transactions(), 0);
    }

    #[tokio::test]
    async fn test_gas_smashing() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let owner = signer.address();
        let a = ledger.mint_coin(owner, 1_500_000);
        let b = ledger.mint_coin(owner, 1_500_000);

        let mut ptb = ProgrammableTransactionBuilder::new();
        let amount = ptb.pure_u64(500_000);
        let coins = ptb.split_coins(Argument::GasCoin, vec![amount]);
        let r = ptb.pure_address(owner);
        ptb.transfer_objects(coins, r);
        let tx = TransactionData::new_programmable(owner, vec![a, b], ptb.finish(), 2_000_000, MOCK_GAS_PRICE);

        let response = ledger.sign_and_execute(&tx, &signer).await.unwrap();
        assert!(response.status.is_success());
        assert_eq!(ledger.owner_of(&b.object_id), None);
        assert!(response
            .object_changes
            .contains(&ObjectChange::Deleted { object_id: b.object_id }));
        assert_eq!(ledger.balance_of(owner), 3_000_000 - MOCK_COMPUTATION_COST);
    }

    #[tokio::test]
    async fn test_signer_mismatch() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let gas = ledger.mint_coin(Address([3u8; 32]), 5_000_000);
        let tx = split_tx(Address([3u8; 32]), gas, &[1], 2_000_000);
        assert!(matches!(
            ledger.sign_and_execute(&tx, &signer).await,
            Err(ChainError::SignerMismatch { .. })
        ));
    }
}
