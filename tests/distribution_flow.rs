//! End-to-end distribution runs against the in-memory ledger
//!
//! Covers:
//! 1. Scenario A: a handful of assets under the limit
//! 2. Scenario B: zero limit, nothing submitted
//! 3. Scenario C: funding failure aborts before any claim
//! 4. Pagination call counts
//! 5. Partial failures (status failures, submission errors, missing data)
//! 6. Pairing mismatch between assets and funding coins
//! 7. Redeeming a produced link with its credential
//! 8. Links reaching the caller while a sibling claim is still stuck

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use linkdrop_chain::{
    ChainError, CoinData, ExecutionResponse, LedgerClient, MockLedger, ObjectChange,
    OwnedObjectsPage, ProgrammableTransactionBuilder, TransactionData, MOCK_COMPUTATION_COST,
    MOCK_GAS_PRICE,
};
use linkdrop_core::{Address, ClaimOutcome, FailureReason, ObjectId};
use linkdrop_crypto::SignerKeypair;
use linkdrop_distributor::{
    DistributionConfig, DistributionReport, Distributor, DistributorError, RunEvent,
};
use linkdrop_link::ParsedLink;

const NFT: &str = "0xfeed::collection::Badge";
const GAS_BUDGET: u64 = 10_000_000;
const TIP: u64 = 5_000;
const WALLET: u64 = 100_000_000_000;

// =============================================================================
// HELPERS
// =============================================================================

struct World {
    ledger: MockLedger,
    signer: SignerKeypair,
    assets: Vec<ObjectId>,
}

impl World {
    fn new(asset_count: usize, wallet: u64) -> Self {
        let ledger = MockLedger::new();
        let signer = SignerKeypair::generate();
        let owner = signer.address();
        let assets = (0..asset_count)
            .map(|_| ledger.mint_object(owner, NFT).object_id)
            .collect();
        if wallet > 0 {
            ledger.mint_coin(owner, wallet);
        }
        Self { ledger, signer, assets }
    }

    fn owner(&self) -> Address {
        self.signer.address()
    }

    fn distributor(&self, config: DistributionConfig) -> Distributor {
        Distributor::new(Arc::new(self.ledger.clone()), self.signer.clone(), config)
    }
}

fn config(limit: usize) -> DistributionConfig {
    DistributionConfig {
        limit,
        gas_budget: GAS_BUDGET,
        tip_amount: TIP,
        ..DistributionConfig::new(NFT)
    }
}

fn assert_accounted(report: &DistributionReport) {
    assert_eq!(
        report.links.len() + report.failures.len(),
        report.discovered,
        "every discovered asset ends as a link or a failure"
    );
}

// =============================================================================
// 1-3. SCENARIOS
// =============================================================================

#[tokio::test]
async fn test_scenario_a_three_assets_limit_five() {
    let world = World::new(3, WALLET);
    let report = world.distributor(config(5)).run().await.unwrap();

    assert_eq!(world.ledger.list_calls(), 1);
    assert_eq!(report.signer, world.owner());
    assert_eq!(report.discovered, 3);
    assert_eq!(report.funding_coins, 3);
    assert_eq!(report.links.len(), 3);
    assert!(report.failures.is_empty());

    let discovered: HashSet<ObjectId> = world.assets.iter().copied().collect();
    let linked: HashSet<ObjectId> = report.links.iter().map(|l| l.asset_id).collect();
    assert_eq!(linked, discovered, "each link references exactly one distinct asset");

    for link in &report.links {
        assert_eq!(link.tip_amount, TIP);
        let claim_address = ParsedLink::parse(&link.url).unwrap().claim_address();
        assert_eq!(world.ledger.owner_of(&link.asset_id), Some(claim_address));
        assert_eq!(world.ledger.balance_of(claim_address), TIP);
    }

    // Funding + one claim per asset
    assert_eq!(world.ledger.executed_transactions(), 4);
}

#[tokio::test]
async fn test_scenario_b_zero_limit() {
    let world = World::new(3, WALLET);
    let report = world.distributor(config(0)).run().await.unwrap();

    assert_eq!(report.discovered, 0);
    assert_eq!(report.funding_coins, 0);
    assert!(report.links.is_empty());
    assert_eq!(world.ledger.list_calls(), 0);
    assert_eq!(world.ledger.executed_transactions(), 0);
    assert_eq!(world.ledger.balance_of(world.owner()), WALLET);
}

#[tokio::test]
async fn test_scenario_c_insufficient_balance() {
    let world = World::new(3, 1_000);
    let err = world.distributor(config(5)).run().await.unwrap_err();

    assert!(matches!(err, DistributorError::FundingFailed(_)));
    assert_eq!(world.ledger.executed_transactions(), 0);
    assert_eq!(world.ledger.objects_owned_by(world.owner(), NFT).len(), 3);
}

#[tokio::test]
async fn test_scenario_c_funding_executes_with_failure() {
    let world = World::new(3, WALLET);
    let mut config = config(5);
    config.funding_gas_budget = MOCK_COMPUTATION_COST - 1;

    let err = world.distributor(config).run().await.unwrap_err();
    assert!(matches!(err, DistributorError::FundingFailed(_)));
    // Only the failed funding transaction reached the ledger
    assert_eq!(world.ledger.executed_transactions(), 1);
    assert_eq!(world.ledger.objects_owned_by(world.owner(), NFT).len(), 3);
}

#[tokio::test]
async fn test_discovery_failure_aborts_run() {
    let world = World::new(80, WALLET);
    world.ledger.fail_listing_after(1);

    let err = world.distributor(config(80)).run().await.unwrap_err();
    assert!(matches!(err, DistributorError::Discovery(_)));
    assert_eq!(world.ledger.executed_transactions(), 0);
}

// =============================================================================
// 4. PAGINATION
// =============================================================================

#[tokio::test]
async fn test_pagination_respects_limit() {
    let world = World::new(120, WALLET);
    let report = world.distributor(config(100)).run().await.unwrap();

    assert_eq!(world.ledger.list_calls(), 2);
    assert_eq!(report.discovered, 100);
    assert_eq!(report.links.len(), 100);
    assert_eq!(world.ledger.objects_owned_by(world.owner(), NFT).len(), 20);
}

#[tokio::test]
async fn test_discover_is_side_effect_free() {
    let world = World::new(60, WALLET);
    let distributor = world.distributor(config(55));

    let first = distributor.discover().await.unwrap();
    let second = distributor.discover().await.unwrap();
    assert_eq!(first.len(), 55);
    assert_eq!(first, second);
    assert_eq!(world.ledger.list_calls(), 4);
    assert_eq!(world.ledger.executed_transactions(), 0);
}

// =============================================================================
// 5. PARTIAL FAILURES
// =============================================================================

#[tokio::test]
async fn test_k_failures_yield_n_minus_k_links() {
    let world = World::new(6, WALLET);
    world.ledger.fail_execution_for(world.assets[1]);
    world.ledger.fail_execution_for(world.assets[4]);

    let report = world.distributor(config(10)).run().await.unwrap();
    assert_accounted(&report);
    assert_eq!(report.links.len(), 4);
    assert_eq!(report.failures.len(), 2);

    let failed: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![1, 4]);
    for failure in &report.failures {
        assert!(matches!(failure.reason, FailureReason::ExecutionFailed(_)));
        let asset = failure.asset_id.unwrap();
        assert_eq!(world.ledger.owner_of(&asset), Some(world.owner()));
        // Gas was spent, the coin itself stays with the signer
        assert_eq!(world.ledger.owner_of(&failure.funding_coin), Some(world.owner()));
    }
}

#[tokio::test]
async fn test_submission_error_does_not_abort_batch() {
    let world = World::new(5, WALLET);
    world.ledger.error_submission_for(world.assets[2]);

    let report = world.distributor(config(10)).run().await.unwrap();
    assert_accounted(&report);
    assert_eq!(report.links.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].asset_id, Some(world.assets[2]));
    assert!(matches!(report.failures[0].reason, FailureReason::Submission(_)));

    // The unused funding coin is reported and untouched
    let coin = report.failures[0].funding_coin;
    assert_eq!(world.ledger.coin_balance(&coin), Some(GAS_BUDGET + TIP));
}

#[tokio::test]
async fn test_entry_without_data_is_skipped() {
    let world = World::new(2, WALLET);
    world.ledger.mint_unreadable_object(world.owner(), NFT);

    let report = world.distributor(config(10)).run().await.unwrap();
    assert_accounted(&report);
    assert_eq!(report.discovered, 3);
    assert_eq!(report.funding_coins, 3);
    assert_eq!(report.links.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert_eq!(report.failures[0].asset_id, None);
    assert_eq!(report.failures[0].reason, FailureReason::MissingObjectData);
}

#[tokio::test]
async fn test_low_concurrency_completes_every_claim() {
    let world = World::new(9, WALLET);
    let mut config = config(9);
    config.concurrency = 1;

    let report = world.distributor(config).run().await.unwrap();
    assert_eq!(report.links.len(), 9);
}

// =============================================================================
// 6. PAIRING MISMATCH
// =============================================================================

/// Drops one created object from every response creating more than one
struct LossyLedger {
    inner: MockLedger,
}

#[async_trait]
impl LedgerClient for LossyLedger {
    async fn list_owned_objects(
        &self,
        owner: Address,
        type_filter: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<OwnedObjectsPage, ChainError> {
        self.inner.list_owned_objects(owner, type_filter, cursor, limit).await
    }

    async fn get_coins(&self, owner: Address) -> Result<Vec<CoinData>, ChainError> {
        self.inner.get_coins(owner).await
    }

    async fn reference_gas_price(&self) -> Result<u64, ChainError> {
        self.inner.reference_gas_price().await
    }

    async fn sign_and_execute(
        &self,
        tx: &TransactionData,
        signer: &SignerKeypair,
    ) -> Result<ExecutionResponse, ChainError> {
        let mut response = self.inner.sign_and_execute(tx, signer).await?;
        if response.created().len() > 1 {
            if let Some(pos) = response
                .object_changes
                .iter()
                .rposition(|c| matches!(c, ObjectChange::Created { .. }))
            {
                response.object_changes.remove(pos);
            }
        }
        Ok(response)
    }
}

#[tokio::test]
async fn test_pairing_mismatch_is_fatal() {
    let world = World::new(4, WALLET);
    let ledger = Arc::new(LossyLedger {
        inner: world.ledger.clone(),
    });
    let distributor = Distributor::new(ledger, world.signer.clone(), config(10));

    let err = distributor.run().await.unwrap_err();
    assert!(matches!(
        err,
        DistributorError::PairingMismatch { assets: 4, coins: 3 }
    ));
    // No claim was attempted
    assert_eq!(world.ledger.executed_transactions(), 1);
    assert_eq!(world.ledger.objects_owned_by(world.owner(), NFT).len(), 4);
}

// =============================================================================
// 7. REDEEMING A LINK
// =============================================================================

#[tokio::test]
async fn test_link_holder_can_redeem() {
    let world = World::new(1, WALLET);
    let tip = 3_000_000;
    let mut config = config(1);
    config.tip_amount = tip;

    let report = world.distributor(config).run().await.unwrap();
    let link = &report.links[0];

    // The holder signs with the link's credential and pays gas with the tip
    let parsed = ParsedLink::parse(&link.url).unwrap();
    let holder = parsed.claim_address();
    let asset = world.ledger.objects_owned_by(holder, NFT)[0];
    let tip_coin = world.ledger.get_coins(holder).await.unwrap()[0];
    assert_eq!(tip_coin.balance, tip);

    let recipient = Address([0x42; 32]);
    let mut ptb = ProgrammableTransactionBuilder::new();
    let obj = ptb.object(asset);
    let to = ptb.pure_address(recipient);
    ptb.transfer_objects(vec![obj], to);
    let tx = TransactionData::new_programmable(
        holder,
        vec![tip_coin.object],
        ptb.finish(),
        2_000_000,
        MOCK_GAS_PRICE,
    );

    let response = world
        .ledger
        .sign_and_execute(&tx, &parsed.credential)
        .await
        .unwrap();
    assert!(response.status.is_success());
    assert_eq!(world.ledger.owner_of(&link.asset_id), Some(recipient));
    assert_eq!(world.ledger.balance_of(holder), tip - MOCK_COMPUTATION_COST);
}

#[tokio::test]
async fn test_report_serializes_links_and_failures() {
    let world = World::new(2, WALLET);
    world.ledger.fail_execution_for(world.assets[0]);

    let report = world.distributor(config(2)).run().await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["discovered"], 2);
    assert_eq!(json["links"].as_array().unwrap().len(), 1);
    assert_eq!(json["failures"][0]["reason"]["kind"], "execution_failed");
    assert_eq!(json["signer"], world.owner().to_string());
}

// =============================================================================
// 8. STREAMED LINKS
// =============================================================================

/// Executes every transaction, then never answers for the one touching `stuck`
struct StallingLedger {
    inner: MockLedger,
    stuck: ObjectId,
}

#[async_trait]
impl LedgerClient for StallingLedger {
    async fn list_owned_objects(
        &self,
        owner: Address,
        type_filter: &str,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<OwnedObjectsPage, ChainError> {
        self.inner.list_owned_objects(owner, type_filter, cursor, limit).await
    }

    async fn get_coins(&self, owner: Address) -> Result<Vec<CoinData>, ChainError> {
        self.inner.get_coins(owner).await
    }

    async fn reference_gas_price(&self) -> Result<u64, ChainError> {
        self.inner.reference_gas_price().await
    }

    async fn sign_and_execute(
        &self,
        tx: &TransactionData,
        signer: &SignerKeypair,
    ) -> Result<ExecutionResponse, ChainError> {
        let response = self.inner.sign_and_execute(tx, signer).await?;
        if tx.kind.object_inputs().any(|o| o.object_id == self.stuck) {
            std::future::pending::<()>().await;
        }
        Ok(response)
    }
}

#[tokio::test]
async fn test_links_surface_before_stuck_claim_finishes() {
    let world = World::new(5, WALLET);
    let ledger = Arc::new(StallingLedger {
        inner: world.ledger.clone(),
        stuck: world.assets[4],
    });
    let distributor = Distributor::new(ledger, world.signer.clone(), config(5));

    let (tx, mut rx) = mpsc::channel(16);
    let run = tokio::spawn(async move { distributor.run_with_events(Some(tx)).await });

    let mut links = Vec::new();
    let mut counts = Vec::new();
    while links.len() < 4 {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("a link was held back")
            .expect("run ended early");
        match event {
            RunEvent::Discovered(n) | RunEvent::Funded(n) => counts.push(n),
            RunEvent::Outcome(ClaimOutcome::Claimed(link)) => links.push(link),
            RunEvent::Outcome(ClaimOutcome::Failed(f)) => panic!("unexpected failure: {:?}", f),
        }
    }

    assert_eq!(counts, vec![5, 5]);
    assert!(!run.is_finished(), "the stuck claim keeps the run open");

    // Every streamed link is already redeemable on the ledger
    for link in &links {
        let claim_address = ParsedLink::parse(&link.url).unwrap().claim_address();
        assert_eq!(world.ledger.owner_of(&link.asset_id), Some(claim_address));
    }
    assert!(links.iter().all(|l| l.asset_id != world.assets[4]));

    run.abort();
}
