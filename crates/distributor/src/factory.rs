//! Per-asset claim submission

use std::sync::Arc;

use tracing::{info, warn};

use linkdrop_chain::{ExecutionStatus, LedgerClient, TransactionData};
use linkdrop_core::{ClaimFailure, ClaimOutcome, FailureReason};
use linkdrop_crypto::SignerKeypair;
use linkdrop_link::{ClaimLinkBuilder, LinkOptions};

use crate::pairing::FundingEntry;

/// Sends one funded asset to a fresh claim address and produces its link.
///
/// Shared read-only across every concurrent claim of a run.
pub struct LinkFactory {
    ledger: Arc<dyn LedgerClient>,
    signer: Arc<SignerKeypair>,
    gas_budget: u64,
    gas_price: u64,
    tip_amount: u64,
    link_options: LinkOptions,
}

impl LinkFactory {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        signer: Arc<SignerKeypair>,
        gas_budget: u64,
        gas_price: u64,
        tip_amount: u64,
        link_options: LinkOptions,
    ) -> Self {
        Self {
            ledger,
            signer,
            gas_budget,
            gas_price,
            tip_amount,
            link_options,
        }
    }

    pub fn tip_amount(&self) -> u64 {
        self.tip_amount
    }

    /// Claim one asset. Every outcome, including errors from the ledger, is
    /// reported as a value.
    pub async fn claim(&self, entry: FundingEntry) -> ClaimOutcome {
        let FundingEntry { asset, coin } = entry;
        let fail = |reason: FailureReason| {
            warn!("Asset #{} produced no link: {}", asset.index, reason);
            ClaimOutcome::Failed(ClaimFailure {
                index: asset.index,
                asset_id: asset.id(),
                funding_coin: coin.id(),
                reason,
            })
        };

        let Some(object) = asset.object else {
            return fail(FailureReason::MissingObjectData);
        };

        let sender = self.signer.address();
        let mut builder = ClaimLinkBuilder::new(sender, self.link_options.clone());
        builder
            .add_claimable_object(object)
            .add_claimable_mist(self.tip_amount);

        let kind = match builder.create_send_transaction() {
            Ok(kind) => kind,
            Err(e) => return fail(FailureReason::Submission(e.to_string())),
        };
        let tx = TransactionData::new_programmable(
            sender,
            vec![coin.object],
            kind,
            self.gas_budget,
            self.gas_price,
        );

        let response = match self.ledger.sign_and_execute(&tx, &self.signer).await {
            Ok(response) => response,
            Err(e) => return fail(FailureReason::Submission(e.to_string())),
        };

        match response.status {
            ExecutionStatus::Success => match builder.finalize() {
                Ok(link) => {
                    info!("Asset #{} claimable via transaction {}", asset.index, response.digest);
                    ClaimOutcome::Claimed(link)
                }
                Err(e) => fail(FailureReason::Submission(e.to_string())),
            },
            ExecutionStatus::Failure { error } => fail(FailureReason::ExecutionFailed(error)),
        }
    }
}
