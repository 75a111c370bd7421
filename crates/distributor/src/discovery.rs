//! Owned-asset discovery

use futures::stream::{self, TryStreamExt};
use tracing::{debug, info};

use linkdrop_chain::{ChainError, LedgerClient, OwnedObjectEntry};
use linkdrop_core::{Address, TargetAsset};

use crate::{DistributorError, Result};

/// Largest page the full node serves per listing request
pub const MAX_PAGE_SIZE: usize = 50;

/// Where the listing stands between two page requests
struct Pagination {
    cursor: Option<String>,
    remaining: usize,
    exhausted: bool,
}

/// List up to `limit` objects of `object_type` owned by `owner`, in ledger
/// order.
///
/// Each request asks for `min(MAX_PAGE_SIZE, remaining)` items. Any failed
/// request fails the whole discovery: funding is sized to the full list, so
/// a partial list is never returned.
pub async fn discover_assets(
    ledger: &dyn LedgerClient,
    owner: Address,
    object_type: &str,
    limit: usize,
) -> Result<Vec<TargetAsset>> {
    let start = Pagination {
        cursor: None,
        remaining: limit,
        exhausted: limit == 0,
    };

    let pages = stream::try_unfold(start, move |state| async move {
        if state.exhausted || state.remaining == 0 {
            return Ok::<_, ChainError>(None);
        }

        let page_size = state.remaining.min(MAX_PAGE_SIZE);
        let page = ledger
            .list_owned_objects(owner, object_type, state.cursor, page_size)
            .await?;
        debug!(
            "Listed {} object(s), has_next_page={}",
            page.data.len(),
            page.has_next_page
        );

        let entries: Vec<OwnedObjectEntry> = page.data.into_iter().take(state.remaining).collect();
        let next = Pagination {
            remaining: state.remaining - entries.len(),
            exhausted: !page.has_next_page || page.next_cursor.is_none() || entries.is_empty(),
            cursor: page.next_cursor,
        };
        Ok(Some((entries, next)))
    });

    let entries = pages
        .try_fold(Vec::new(), |mut acc, entries| async move {
            acc.extend(entries);
            Ok::<_, ChainError>(acc)
        })
        .await
        .map_err(DistributorError::Discovery)?;

    let assets: Vec<TargetAsset> = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| TargetAsset {
            index,
            object: entry.object,
            object_type: entry.object_type,
        })
        .collect();

    info!("Discovered {} asset(s) of type {}", assets.len(), object_type);
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdrop_chain::MockLedger;

    const NFT: &str = "0xabc::nft::Nft";

    fn seeded(count: usize) -> (MockLedger, Address) {
        let ledger = MockLedger::new();
        let owner = Address([1u8; 32]);
        for _ in 0..count {
            ledger.mint_object(owner, NFT);
        }
        (ledger, owner)
    }

    #[tokio::test]
    async fn test_zero_limit_makes_no_calls() {
        let (ledger, owner) = seeded(3);
        let assets = discover_assets(&ledger, owner, NFT, 0).await.unwrap();
        assert!(assets.is_empty());
        assert_eq!(ledger.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_fewer_assets_than_limit() {
        let (ledger, owner) = seeded(3);
        let assets = discover_assets(&ledger, owner, NFT, 5).await.unwrap();
        assert_eq!(assets.len(), 3);
        assert_eq!(ledger.list_calls(), 1);
        let indices: Vec<_> = assets.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_limit_caps_and_page_count() {
        // min(C, L) = 120 -> ceil(120 / 50) = 3 calls
        let (ledger, owner) = seeded(130);
        let assets = discover_assets(&ledger, owner, NFT, 120).await.unwrap();
        assert_eq!(assets.len(), 120);
        assert_eq!(ledger.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_exact_page_boundary() {
        let (ledger, owner) = seeded(100);
        let assets = discover_assets(&ledger, owner, NFT, 500).await.unwrap();
        assert_eq!(assets.len(), 100);
        assert_eq!(ledger.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_discovery_is_repeatable() {
        let (ledger, owner) = seeded(75);
        let first = discover_assets(&ledger, owner, NFT, 60).await.unwrap();
        let second = discover_assets(&ledger, owner, NFT, 60).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_listing_error_aborts_discovery() {
        let (ledger, owner) = seeded(80);
        ledger.fail_listing_after(1);
        let err = discover_assets(&ledger, owner, NFT, 80).await.unwrap_err();
        assert!(matches!(err, DistributorError::Discovery(_)));
    }

    #[tokio::test]
    async fn test_entries_without_data_keep_their_slot() {
        let ledger = MockLedger::new();
        let owner = Address([1u8; 32]);
        ledger.mint_object(owner, NFT);
        ledger.mint_unreadable_object(owner, NFT);
        ledger.mint_object(owner, NFT);

        let assets = discover_assets(&ledger, owner, NFT, 10).await.unwrap();
        assert_eq!(assets.len(), 3);
        assert!(assets[1].object.is_none());
        assert_eq!(assets[2].index, 2);
    }
}
