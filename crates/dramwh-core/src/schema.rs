//! The fixed warehouse schema.

use crate::{
  dimension::{DATE_DIM, REGION_DIM},
  entity::EntityDescriptor,
  fact::{
    COMPETITOR_PRICING, DATACENTER_DEMAND, DRAM_PRICES, DRAM_PRODUCTION,
    MACRO_INDICATORS, PC_SHIPMENTS, SMARTPHONE_SHIPMENTS,
  },
};

/// Every managed table, parents before children.
///
/// Create in this order; drop and truncate in reverse.
pub const TABLES: &[&EntityDescriptor] = &[
  &DATE_DIM,
  &REGION_DIM,
  &DRAM_PRICES,
  &DRAM_PRODUCTION,
  &SMARTPHONE_SHIPMENTS,
  &PC_SHIPMENTS,
  &DATACENTER_DEMAND,
  &MACRO_INDICATORS,
  &COMPETITOR_PRICING,
];

/// Tables in drop/truncate order (children first).
pub fn children_first() -> impl Iterator<Item = &'static EntityDescriptor> {
  TABLES.iter().rev().copied()
}

pub fn find(table: &str) -> Option<&'static EntityDescriptor> {
  TABLES.iter().copied().find(|d| d.table == table)
}
