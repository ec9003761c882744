//! Dimension reconciliation for the dramwh warehouse.
//!
//! [`ensure_date_dim`] and [`ensure_region_dim`] bring the two dimension
//! tables up to date by writing only the rows they are missing.
//! [`Bootstrap`] sequences them after schema initialisation and is what the
//! `dramwh` binary drives.

pub mod date;
pub mod error;
pub mod feed;
pub mod region;

use chrono::{Local, NaiveDate};
use dramwh_core::store::{SchemaReset, WarehouseStore};
use tracing::info;

pub use date::{ensure_date_dim, DateFill, MAX_YEARS_AHEAD};
pub use error::{Error, Result};
pub use feed::RegionFeed;
pub use region::{ensure_region_dim, sync_regions, RegionSync};

/// Years of future dates kept in `date_dim` unless configured otherwise.
pub const DEFAULT_YEARS_AHEAD: u32 = 1;

/// What a [`Bootstrap`] pass did; a reconciler that was not run is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DimensionReport {
  pub date:   Option<DateFill>,
  pub region: Option<RegionSync>,
}

/// Schema initialisation plus dimension reconciliation over one store and
/// one region feed.
pub struct Bootstrap<S, F> {
  store:       S,
  feed:        F,
  years_ahead: u32,
  today:       Option<NaiveDate>,
}

impl<S: WarehouseStore, F: RegionFeed> Bootstrap<S, F> {
  pub fn new(store: S, feed: F) -> Self {
    Self {
      store,
      feed,
      years_ahead: DEFAULT_YEARS_AHEAD,
      today: None,
    }
  }

  pub fn years_ahead(mut self, years: u32) -> Self {
    self.years_ahead = years;
    self
  }

  /// Pin the date treated as today instead of reading the local clock.
  pub fn today(mut self, today: NaiveDate) -> Self {
    self.today = Some(today);
    self
  }

  pub fn store(&self) -> &S { &self.store }

  fn current_date(&self) -> NaiveDate {
    self.today.unwrap_or_else(|| Local::now().date_naive())
  }

  /// Reconcile `date_dim` when `date` is set, then `region_dim` when
  /// `region` is set.
  pub async fn ensure_dimensions(&self, date: bool, region: bool) -> Result<DimensionReport> {
    let mut report = DimensionReport::default();
    if date {
      report.date = Some(ensure_date_dim(&self.store, self.current_date(), self.years_ahead).await?);
    }
    if region {
      report.region = Some(ensure_region_dim(&self.store, &self.feed).await?);
    }
    Ok(report)
  }

  /// Create (or drop and recreate) the schema, then fill the dimensions.
  /// Regions are loaded only after a destructive reset.
  pub async fn init_schema(&self, reset: SchemaReset) -> Result<DimensionReport> {
    self.run(reset, false).await
  }

  /// [`init_schema`](Self::init_schema), additionally loading regions on a
  /// non-destructive start when `refresh_regions` is set.
  ///
  /// Settings and, when regions will be loaded, the feed are checked before
  /// the schema is touched, so a bad `years_ahead` or an unreachable feed
  /// leaves the store as it was.
  pub async fn run(&self, reset: SchemaReset, refresh_regions: bool) -> Result<DimensionReport> {
    date::check_years_ahead(self.years_ahead)?;
    let rows = if reset.is_destructive() || refresh_regions {
      Some(self.feed.fetch().await?)
    } else {
      None
    };

    self.store.init_schema(reset).await.map_err(Error::store)?;

    let mut report = DimensionReport {
      date:   Some(ensure_date_dim(&self.store, self.current_date(), self.years_ahead).await?),
      region: None,
    };
    if let Some(rows) = rows {
      report.region = Some(sync_regions(&self.store, self.feed.origin(), &rows).await?);
    }

    info!(?reset, ?report, "bootstrap complete");
    Ok(report)
  }
}
