//! Explicit asset / funding-coin pairing

use linkdrop_core::{FundingCoin, TargetAsset};

use crate::{DistributorError, Result};

/// One asset together with the coin that pays for its claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingEntry {
    pub asset: TargetAsset,
    pub coin: FundingCoin,
}

/// Positional pairing of discovered assets with funding coins.
///
/// Asset `i` is funded by coin `i` and by no other. The table can only be
/// built from lists of equal length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingTable {
    entries: Vec<FundingEntry>,
}

impl FundingTable {
    pub fn pair(assets: Vec<TargetAsset>, coins: Vec<FundingCoin>) -> Result<Self> {
        if assets.len() != coins.len() {
            return Err(DistributorError::PairingMismatch {
                assets: assets.len(),
                coins: coins.len(),
            });
        }

        let entries = assets
            .into_iter()
            .zip(coins)
            .map(|(asset, coin)| FundingEntry { asset, coin })
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FundingEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<FundingEntry> {
        self.entries
    }
}
