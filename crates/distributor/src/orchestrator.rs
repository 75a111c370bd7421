//! Batch orchestration

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use linkdrop_chain::LedgerClient;
use linkdrop_core::{Address, ClaimFailure, ClaimLink, ClaimOutcome, FailureReason, TargetAsset};
use linkdrop_crypto::SignerKeypair;

use crate::allocator::{allocate_funding, FundingRequest};
use crate::config::DistributionConfig;
use crate::discovery::discover_assets;
use crate::factory::LinkFactory;
use crate::pairing::FundingTable;
use crate::{DistributorError, Result};

/// Outcome of one distribution run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionReport {
    pub signer: Address,
    /// Assets found by discovery
    pub discovered: usize,
    /// Coins created by the funding transaction
    pub funding_coins: usize,
    /// Produced links, in completion order
    pub links: Vec<ClaimLink>,
    /// Assets that produced no link, by discovery index
    pub failures: Vec<ClaimFailure>,
}

impl DistributionReport {
    pub fn empty(signer: Address) -> Self {
        Self {
            signer,
            discovered: 0,
            funding_coins: 0,
            links: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn from_outcomes(
        signer: Address,
        discovered: usize,
        funding_coins: usize,
        outcomes: Vec<ClaimOutcome>,
    ) -> Self {
        let mut links = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                ClaimOutcome::Claimed(link) => links.push(link),
                ClaimOutcome::Failed(failure) => failures.push(failure),
            }
        }
        failures.sort_by_key(|f| f.index);

        Self {
            signer,
            discovered,
            funding_coins,
            links,
            failures,
        }
    }
}

/// Progress of a run, delivered as soon as each step is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Discovery finished with this many assets
    Discovered(usize),
    /// The funding transaction created this many coins
    Funded(usize),
    /// One claim reached its terminal state
    Outcome(ClaimOutcome),
}

/// Forward `event` to `events`, if anyone is listening
async fn emit(events: Option<&mpsc::Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        if tx.send(event).await.is_err() {
            debug!("Run event receiver dropped");
        }
    }
}

/// Claim every entry of `table`, at most `concurrency` at a time.
///
/// Waits for all claims and returns one outcome per entry. Each outcome is
/// also sent to `events` the moment its claim completes, so a produced link
/// is never held back by slower siblings. Each claim runs as its own task;
/// a task that dies is recorded as a failure of its asset and never cancels
/// its siblings.
pub async fn claim_all(
    factory: Arc<LinkFactory>,
    table: FundingTable,
    concurrency: usize,
    events: Option<&mpsc::Sender<RunEvent>>,
) -> Vec<ClaimOutcome> {
    stream::iter(table.into_entries())
        .map(|entry| {
            let factory = factory.clone();
            let index = entry.asset.index;
            let asset_id = entry.asset.id();
            let funding_coin = entry.coin.id();
            async move {
                match tokio::spawn(async move { factory.claim(entry).await }).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Claim task for asset #{} aborted: {}", index, e);
                        ClaimOutcome::Failed(ClaimFailure {
                            index,
                            asset_id,
                            funding_coin,
                            reason: FailureReason::Submission(format!("claim task aborted: {}", e)),
                        })
                    }
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .then(move |outcome| async move {
            emit(events, RunEvent::Outcome(outcome.clone())).await;
            outcome
        })
        .collect()
        .await
}

/// Runs the whole pipeline for one signer
pub struct Distributor {
    ledger: Arc<dyn LedgerClient>,
    signer: Arc<SignerKeypair>,
    config: DistributionConfig,
}

impl Distributor {
    pub fn new(ledger: Arc<dyn LedgerClient>, signer: SignerKeypair, config: DistributionConfig) -> Self {
        Self {
            ledger,
            signer: Arc::new(signer),
            config,
        }
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Discovery only; changes nothing on the ledger
    pub async fn discover(&self) -> Result<Vec<TargetAsset>> {
        discover_assets(
            self.ledger.as_ref(),
            self.signer_address(),
            &self.config.object_type,
            self.config.limit,
        )
        .await
    }

    /// Discover, fund, pair and claim.
    ///
    /// Errors only when the run cannot fund any claim (discovery, funding or
    /// pairing failed). Per-asset failures end up in the report.
    pub async fn run(&self) -> Result<DistributionReport> {
        self.run_with_events(None).await
    }

    /// [`Distributor::run`], streaming counts and per-claim outcomes to
    /// `events` while the run is still in progress
    pub async fn run_with_events(
        &self,
        events: Option<mpsc::Sender<RunEvent>>,
    ) -> Result<DistributionReport> {
        let events = events.as_ref();
        let signer = self.signer_address();
        info!("Distributing {} as {}", self.config.object_type, signer);

        self.config.check_limit()?;
        let value = self.config.coin_value().ok_or_else(|| {
            DistributorError::FundingFailed("gas budget plus tip overflows u64".to_string())
        })?;

        let assets = self.discover().await?;
        let discovered = assets.len();
        emit(events, RunEvent::Discovered(discovered)).await;
        if assets.is_empty() {
            info!("No assets to distribute");
            return Ok(DistributionReport::empty(signer));
        }

        let gas_price = self.ledger.reference_gas_price().await?;
        let request = FundingRequest {
            count: discovered,
            value,
            gas_budget: self.config.funding_gas_budget,
            gas_price,
        };
        let coins = allocate_funding(self.ledger.as_ref(), &self.signer, &request).await?;
        let funding_coins = coins.len();
        emit(events, RunEvent::Funded(funding_coins)).await;
        let table = FundingTable::pair(assets, coins)?;

        let factory = Arc::new(LinkFactory::new(
            self.ledger.clone(),
            self.signer.clone(),
            self.config.gas_budget,
            gas_price,
            self.config.tip_amount,
            self.config.link_options.clone(),
        ));
        let outcomes = claim_all(factory, table, self.config.worker_count(), events).await;

        let report = DistributionReport::from_outcomes(signer, discovered, funding_coins, outcomes);
        info!(
            "Run complete: {} link(s), {} failure(s) out of {} asset(s)",
            report.links.len(),
            report.failures.len(),
            report.discovered
        );
        Ok(report)
    }
}
