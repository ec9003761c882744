//! Fact tables.
//!
//! Every fact row references `date_dim` by its `date` column; shipments and
//! macro indicators also reference `region_dim`. Facts are written by
//! ingestion jobs through the generic store operations only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{Column, ColumnType, EntityDescriptor, KeyKind, impl_entity};

const fn id() -> Column { Column::new("id", ColumnType::Integer).not_null() }

const fn date_ref() -> Column {
  Column::new("date", ColumnType::Date)
    .not_null()
    .references("date_dim", "date")
}

const fn region_ref() -> Column {
  Column::new("region_id", ColumnType::Integer).references("region_dim", "region_id")
}

// ─── DRAM market ─────────────────────────────────────────────────────────────

pub const DRAM_PRICES: EntityDescriptor = EntityDescriptor {
  table:    "dram_prices",
  key_kind: KeyKind::Generated,
  columns:  &[
    id(),
    date_ref(),
    Column::new("dram_type", ColumnType::Text(50)).not_null(),
    Column::new("price_usd", ColumnType::Real).not_null(),
    Column::new("source", ColumnType::Text(100)).default_sql("'manual'"),
  ],
};

/// A DRAM price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DramPrices {
  pub id:        Option<i64>,
  pub date:      NaiveDate,
  pub dram_type: String,
  pub price_usd: f64,
  pub source:    Option<String>,
}

impl DramPrices {
  /// A manually entered price; `source` defaults to `"manual"`.
  pub fn new(date: NaiveDate, dram_type: impl Into<String>, price_usd: f64) -> Self {
    Self {
      id: None,
      date,
      dram_type: dram_type.into(),
      price_usd,
      source: Some("manual".to_owned()),
    }
  }
}

impl_entity!(DramPrices, DRAM_PRICES, [id, date, dram_type, price_usd, source]);

pub const DRAM_PRODUCTION: EntityDescriptor = EntityDescriptor {
  table:    "dram_production",
  key_kind: KeyKind::Generated,
  columns:  &[
    id(),
    date_ref(),
    Column::new("fab_location", ColumnType::Text(100)),
    Column::new("dram_type", ColumnType::Text(50)),
    Column::new("capacity_million_gb", ColumnType::Real),
    Column::new("utilization_rate", ColumnType::Real),
  ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DramProduction {
  pub id:                  Option<i64>,
  pub date:                NaiveDate,
  pub fab_location:        Option<String>,
  pub dram_type:           Option<String>,
  pub capacity_million_gb: Option<f64>,
  /// Fraction of capacity in use, 0.0–1.0.
  pub utilization_rate:    Option<f64>,
}

impl_entity!(DramProduction, DRAM_PRODUCTION, [
  id,
  date,
  fab_location,
  dram_type,
  capacity_million_gb,
  utilization_rate,
]);

pub const COMPETITOR_PRICING: EntityDescriptor = EntityDescriptor {
  table:    "competitor_pricing",
  key_kind: KeyKind::Generated,
  columns:  &[
    id(),
    date_ref(),
    Column::new("competitor", ColumnType::Text(100)),
    Column::new("dram_type", ColumnType::Text(50)),
    Column::new("price_usd", ColumnType::Real),
  ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorPricing {
  pub id:         Option<i64>,
  pub date:       NaiveDate,
  pub competitor: Option<String>,
  pub dram_type:  Option<String>,
  pub price_usd:  Option<f64>,
}

impl_entity!(CompetitorPricing, COMPETITOR_PRICING, [
  id,
  date,
  competitor,
  dram_type,
  price_usd,
]);

// ─── Demand ──────────────────────────────────────────────────────────────────

pub const SMARTPHONE_SHIPMENTS: EntityDescriptor = EntityDescriptor {
  table:    "smartphone_shipments",
  key_kind: KeyKind::Generated,
  columns:  &[
    id(),
    date_ref(),
    Column::new("brand", ColumnType::Text(100)),
    region_ref(),
    Column::new("shipments_million_units", ColumnType::Real),
  ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartphoneShipments {
  pub id:                      Option<i64>,
  pub date:                    NaiveDate,
  pub brand:                   Option<String>,
  pub region_id:               Option<i64>,
  pub shipments_million_units: Option<f64>,
}

impl_entity!(SmartphoneShipments, SMARTPHONE_SHIPMENTS, [
  id,
  date,
  brand,
  region_id,
  shipments_million_units,
]);

pub const PC_SHIPMENTS: EntityDescriptor = EntityDescriptor {
  table:    "pc_shipments",
  key_kind: KeyKind::Generated,
  columns:  &[
    id(),
    date_ref(),
    Column::new("brand", ColumnType::Text(100)),
    Column::new("shipments_million_units", ColumnType::Real),
  ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcShipments {
  pub id:                      Option<i64>,
  pub date:                    NaiveDate,
  pub brand:                   Option<String>,
  pub shipments_million_units: Option<f64>,
}

impl_entity!(PcShipments, PC_SHIPMENTS, [
  id,
  date,
  brand,
  shipments_million_units,
]);

pub const DATACENTER_DEMAND: EntityDescriptor = EntityDescriptor {
  table:    "datacenter_demand",
  key_kind: KeyKind::Generated,
  columns:  &[
    id(),
    date_ref(),
    Column::new("application", ColumnType::Text(100)),
    Column::new("demand_million_gb", ColumnType::Real),
  ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatacenterDemand {
  pub id:                Option<i64>,
  pub date:              NaiveDate,
  pub application:       Option<String>,
  pub demand_million_gb: Option<f64>,
}

impl_entity!(DatacenterDemand, DATACENTER_DEMAND, [
  id,
  date,
  application,
  demand_million_gb,
]);

// ─── Macro ───────────────────────────────────────────────────────────────────

pub const MACRO_INDICATORS: EntityDescriptor = EntityDescriptor {
  table:    "macro_indicators",
  key_kind: KeyKind::Generated,
  columns:  &[
    id(),
    date_ref(),
    Column::new("indicator", ColumnType::Text(100)),
    Column::new("value", ColumnType::Real),
    region_ref(),
  ],
};

/// A macroeconomic series point, global when `region_id` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroIndicators {
  pub id:        Option<i64>,
  pub date:      NaiveDate,
  pub indicator: Option<String>,
  pub value:     Option<f64>,
  pub region_id: Option<i64>,
}

impl_entity!(MacroIndicators, MACRO_INDICATORS, [
  id,
  date,
  indicator,
  value,
  region_id,
]);
