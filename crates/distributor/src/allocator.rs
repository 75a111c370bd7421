//! Funding coin allocation
//!
//! A single transaction splits the signer's balance into one coin per asset
//! and sends them all back to the signer. The ledger executes it atomically:
//! either every coin exists afterwards or none does.

use tracing::{debug, info};

use linkdrop_chain::{
    Argument, CoinData, ExecutionStatus, LedgerClient, ProgrammableTransactionBuilder,
    TransactionData,
};
use linkdrop_core::{Address, FundingCoin, ObjectRef};
use linkdrop_crypto::SignerKeypair;

use crate::config::MAX_LIMIT;
use crate::{DistributorError, Result};

/// Most coins a transaction may use as gas payment
const MAX_GAS_PAYMENT_OBJECTS: usize = 256;

/// Size and pricing of one funding transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingRequest {
    /// Number of coins to create
    pub count: usize,
    /// Value of each created coin, in MIST
    pub value: u64,
    pub gas_budget: u64,
    pub gas_price: u64,
}

impl FundingRequest {
    /// Total balance the gas payment must cover
    fn required_balance(&self) -> Option<u64> {
        (self.count as u64)
            .checked_mul(self.value)?
            .checked_add(self.gas_budget)
    }
}

/// Largest coins first, until `required` is covered
fn select_gas_coins(mut coins: Vec<CoinData>, required: u64) -> Result<Vec<ObjectRef>> {
    coins.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut selected = Vec::new();
    let mut total: u64 = 0;
    for coin in coins {
        if total >= required {
            break;
        }
        total = total.saturating_add(coin.balance);
        selected.push(coin.object);
    }

    if total < required {
        return Err(DistributorError::FundingFailed(format!(
            "insufficient balance: have {} MIST, need {} MIST",
            total, required
        )));
    }
    if selected.len() > MAX_GAS_PAYMENT_OBJECTS {
        return Err(DistributorError::FundingFailed(format!(
            "covering {} MIST needs {} gas coins, more than the {} allowed",
            required,
            selected.len(),
            MAX_GAS_PAYMENT_OBJECTS
        )));
    }
    Ok(selected)
}

/// `SplitCoins(GasCoin, [value; count])` then `TransferObjects(coins, signer)`
pub fn build_funding_transaction(
    signer: Address,
    gas_payment: Vec<ObjectRef>,
    request: &FundingRequest,
) -> TransactionData {
    let mut ptb = ProgrammableTransactionBuilder::new();
    let amount = ptb.pure_u64(request.value);
    let coins = ptb.split_coins(Argument::GasCoin, vec![amount; request.count]);
    let recipient = ptb.pure_address(signer);
    ptb.transfer_objects(coins, recipient);

    TransactionData::new_programmable(
        signer,
        gas_payment,
        ptb.finish(),
        request.gas_budget,
        request.gas_price,
    )
}

/// Create `request.count` coins of `request.value` each.
///
/// Returns the created coins in creation order. A zero count returns
/// immediately without touching the ledger.
pub async fn allocate_funding(
    ledger: &dyn LedgerClient,
    signer: &SignerKeypair,
    request: &FundingRequest,
) -> Result<Vec<FundingCoin>> {
    if request.count == 0 {
        debug!("Nothing to fund, skipping funding transaction");
        return Ok(Vec::new());
    }

    if request.count > MAX_LIMIT {
        return Err(DistributorError::LimitTooLarge {
            limit: request.count,
            max: MAX_LIMIT,
        });
    }

    let required = request.required_balance().ok_or_else(|| {
        DistributorError::FundingFailed("required balance overflows u64".to_string())
    })?;

    let owner = signer.address();
    let gas_payment = select_gas_coins(ledger.get_coins(owner).await?, required)?;
    debug!(
        "Funding {} coin(s) of {} MIST from {} gas coin(s)",
        request.count,
        request.value,
        gas_payment.len()
    );

    let tx = build_funding_transaction(owner, gas_payment, request);
    let response = ledger
        .sign_and_execute(&tx, signer)
        .await
        .map_err(|e| DistributorError::FundingFailed(e.to_string()))?;

    if let ExecutionStatus::Failure { error } = &response.status {
        return Err(DistributorError::FundingFailed(format!(
            "transaction {} failed: {}",
            response.digest, error
        )));
    }

    let coins: Vec<FundingCoin> = response
        .created()
        .into_iter()
        .map(|object| FundingCoin {
            object,
            value: request.value,
        })
        .collect();

    info!(
        "Funding transaction {} created {} coin(s)",
        response.digest,
        coins.len()
    );
    Ok(coins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdrop_chain::{CallArg, Command, MockLedger, MOCK_COMPUTATION_COST, MOCK_GAS_PRICE};
    use linkdrop_core::{ObjectDigest, ObjectId};

    fn request(count: usize, value: u64) -> FundingRequest {
        FundingRequest {
            count,
            value,
            gas_budget: 50_000_000,
            gas_price: MOCK_GAS_PRICE,
        }
    }

    fn coin(byte: u8, balance: u64) -> CoinData {
        CoinData {
            object: ObjectRef::new(ObjectId([byte; 32]), 1, ObjectDigest([byte; 32])),
            balance,
        }
    }

    #[test]
    fn test_transaction_shape() {
        let signer = Address([4u8; 32]);
        let tx = build_funding_transaction(signer, vec![coin(1, 0).object], &request(3, 700));

        let pt = &tx.kind;
        // One shared amount input plus the recipient
        assert_eq!(pt.inputs.len(), 2);
        assert_eq!(pt.inputs[0], CallArg::Pure(700u64.to_le_bytes().to_vec()));
        assert_eq!(
            pt.commands[0],
            Command::SplitCoins(Argument::GasCoin, vec![Argument::Input(0); 3])
        );
        assert_eq!(
            pt.commands[1],
            Command::TransferObjects(
                vec![
                    Argument::NestedResult(0, 0),
                    Argument::NestedResult(0, 1),
                    Argument::NestedResult(0, 2)
                ],
                Argument::Input(1)
            )
        );
        assert_eq!(tx.sender, signer);
        assert_eq!(tx.gas_data.owner, signer);
    }

    #[test]
    fn test_select_largest_first() {
        let selected =
            select_gas_coins(vec![coin(1, 10), coin(2, 500), coin(3, 100)], 550).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].object_id, ObjectId([2u8; 32]));
        assert_eq!(selected[1].object_id, ObjectId([3u8; 32]));
    }

    #[test]
    fn test_select_insufficient() {
        let err = select_gas_coins(vec![coin(1, 10)], 11).unwrap_err();
        assert!(matches!(err, DistributorError::FundingFailed(_)));
    }

    #[tokio::test]
    async fn test_zero_count_skips_ledger() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let coins = allocate_funding(&ledger, &signer, &request(0, 100)).await.unwrap();
        assert!(coins.is_empty());
        assert_eq!(ledger.executed_transactions(), 0);
    }

    #[tokio::test]
    async fn test_allocates_exact_count() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        ledger.mint_coin(signer.address(), 1_000_000_000);

        let coins = allocate_funding(&ledger, &signer, &request(5, 2_000_000)).await.unwrap();
        assert_eq!(coins.len(), 5);
        for c in &coins {
            assert_eq!(c.value, 2_000_000);
            assert_eq!(ledger.coin_balance(&c.id()), Some(2_000_000));
            assert_eq!(ledger.owner_of(&c.id()), Some(signer.address()));
        }
        assert_eq!(
            ledger.balance_of(signer.address()),
            1_000_000_000 - MOCK_COMPUTATION_COST
        );
    }

    #[tokio::test]
    async fn test_oversized_batch_is_refused() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        ledger.mint_coin(signer.address(), u64::MAX / 2);

        let err = allocate_funding(&ledger, &signer, &request(MAX_LIMIT + 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DistributorError::LimitTooLarge { .. }));
        assert_eq!(ledger.executed_transactions(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_balance_submits_nothing() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        ledger.mint_coin(signer.address(), 1_000);

        let err = allocate_funding(&ledger, &signer, &request(3, 2_000_000)).await.unwrap_err();
        assert!(matches!(err, DistributorError::FundingFailed(_)));
        assert_eq!(ledger.executed_transactions(), 0);
    }

    #[tokio::test]
    async fn test_failed_execution_is_fatal() {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        ledger.mint_coin(signer.address(), 1_000_000_000);
        // Computation cost above the budget: executes with a failure status
        ledger.set_computation_cost(60_000_000);

        let err = allocate_funding(&ledger, &signer, &request(2, 1_000)).await.unwrap_err();
        assert!(matches!(err, DistributorError::FundingFailed(_)));
        assert_eq!(ledger.executed_transactions(), 1);
    }
}
