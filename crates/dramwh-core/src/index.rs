//! On-demand lookups from dimension keys to fact rows.
//!
//! Facts point at their dimensions through plain foreign-key fields. The
//! reverse direction (all facts for a day or a region) is built here from
//! fetched rows instead of being held as a relationship graph.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
  entity::Entity,
  fact::{
    CompetitorPricing, DatacenterDemand, DramPrices, DramProduction,
    MacroIndicators, PcShipments, SmartphoneShipments,
  },
};

/// A fact row keyed to `date_dim`.
pub trait DatedFact: Entity {
  fn date(&self) -> NaiveDate;
}

/// A fact row that may reference `region_dim`.
pub trait RegionalFact: Entity {
  fn region_id(&self) -> Option<i64>;
}

macro_rules! dated {
  ($($ty:ident),+) => {
    $(impl DatedFact for $ty {
      fn date(&self) -> NaiveDate { self.date }
    })+
  };
}

dated!(
  DramPrices,
  DramProduction,
  SmartphoneShipments,
  PcShipments,
  DatacenterDemand,
  MacroIndicators,
  CompetitorPricing
);

impl RegionalFact for SmartphoneShipments {
  fn region_id(&self) -> Option<i64> { self.region_id }
}

impl RegionalFact for MacroIndicators {
  fn region_id(&self) -> Option<i64> { self.region_id }
}

/// Group facts by their date, preserving input order within each day.
pub fn index_by_date<F: DatedFact>(
  facts: impl IntoIterator<Item = F>,
) -> BTreeMap<NaiveDate, Vec<F>> {
  let mut index: BTreeMap<NaiveDate, Vec<F>> = BTreeMap::new();
  for fact in facts {
    index.entry(fact.date()).or_default().push(fact);
  }
  index
}

/// Group facts by region; facts without a region are dropped.
pub fn index_by_region<F: RegionalFact>(
  facts: impl IntoIterator<Item = F>,
) -> BTreeMap<i64, Vec<F>> {
  let mut index: BTreeMap<i64, Vec<F>> = BTreeMap::new();
  for fact in facts {
    if let Some(region) = fact.region_id() {
      index.entry(region).or_default().push(fact);
    }
  }
  index
}
