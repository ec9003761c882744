//! Insert-or-skip population of `region_dim` from the country feed.

use std::collections::HashSet;

use dramwh_core::{dimension::RegionDim, region::CountryRow, store::WarehouseStore};
use tracing::{info, warn};

use crate::{feed::RegionFeed, Error, Result};

/// Per-row tally of one region reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSync {
  pub inserted: usize,
  /// Rows whose country code was already present.
  pub skipped:  usize,
  /// Rows the store rejected or that had no usable code.
  pub failed:   usize,
}

/// Insert every feed country whose code is not yet in `region_dim`.
///
/// Existing rows are never updated. Each new row is written under its own
/// savepoint, so one bad row is counted and logged without affecting the
/// rest. A feed that cannot be fetched fails the whole call.
pub async fn ensure_region_dim<S, F>(store: &S, feed: &F) -> Result<RegionSync>
where
  S: WarehouseStore,
  F: RegionFeed,
{
  let rows = feed.fetch().await?;
  sync_regions(store, feed.origin(), &rows).await
}

/// The store half of [`ensure_region_dim`], for rows already fetched.
pub async fn sync_regions<S: WarehouseStore>(
  store: &S,
  origin: &str,
  rows: &[CountryRow],
) -> Result<RegionSync> {
  let existing: HashSet<String> = store
    .fetch_all::<RegionDim>()
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|r| r.country_code)
    .collect();

  let mut sync = RegionSync::default();
  let mut pending = Vec::new();
  let mut sources: Vec<&CountryRow> = Vec::new();

  for row in rows {
    match RegionDim::from_country(row) {
      None => {
        sync.failed += 1;
        warn!(?row, "feed row has no country code");
      }
      Some(region) if existing.contains(&region.country_code) => sync.skipped += 1,
      Some(region) => {
        pending.push(region);
        sources.push(row);
      }
    }
  }

  if !pending.is_empty() {
    let outcomes = store.add_each(pending).await.map_err(Error::store)?;
    for (outcome, row) in outcomes.into_iter().zip(sources) {
      match outcome {
        Ok(_) => sync.inserted += 1,
        Err(err) => {
          sync.failed += 1;
          warn!(?row, error = %err, "region row rejected");
        }
      }
    }
  }

  info!(
    origin,
    inserted = sync.inserted,
    skipped = sync.skipped,
    failed = sync.failed,
    "region_dim reconciled"
  );
  Ok(sync)
}
