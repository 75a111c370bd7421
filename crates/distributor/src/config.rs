//! Pipeline parameters

use linkdrop_link::LinkOptions;

/// Gas budget of each claim transaction, in MIST
pub const DEFAULT_GAS_BUDGET: u64 = 10_000_000;

/// Gas budget of the funding transaction, in MIST
pub const DEFAULT_FUNDING_GAS_BUDGET: u64 = 100_000_000;

/// Claim transactions in flight at once
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Maximum number of assets processed per run
pub const DEFAULT_LIMIT: usize = 50;

/// Hard cap on assets per run. The funding transaction splits one coin per
/// asset in a single command, and the ledger bounds a command's arguments.
pub const MAX_LIMIT: usize = 500;

/// Parameters of one distribution run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionConfig {
    /// Type of the assets to distribute
    pub object_type: String,
    pub limit: usize,
    pub gas_budget: u64,
    /// Native currency bundled into every link, in MIST
    pub tip_amount: u64,
    pub funding_gas_budget: u64,
    pub concurrency: usize,
    pub link_options: LinkOptions,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            object_type: String::new(),
            limit: DEFAULT_LIMIT,
            gas_budget: DEFAULT_GAS_BUDGET,
            tip_amount: 0,
            funding_gas_budget: DEFAULT_FUNDING_GAS_BUDGET,
            concurrency: DEFAULT_CONCURRENCY,
            link_options: LinkOptions::default(),
        }
    }
}

impl DistributionConfig {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            ..Default::default()
        }
    }

    /// Value of each funding coin: one claim's gas budget plus its tip
    pub fn coin_value(&self) -> Option<u64> {
        self.gas_budget.checked_add(self.tip_amount)
    }

    /// `limit` within [`MAX_LIMIT`]
    pub fn check_limit(&self) -> crate::Result<()> {
        if self.limit > MAX_LIMIT {
            return Err(crate::DistributorError::LimitTooLarge {
                limit: self.limit,
                max: MAX_LIMIT,
            });
        }
        Ok(())
    }

    /// Worker pool size, never below one
    pub fn worker_count(&self) -> usize {
        self.concurrency.max(1)
    }
}
