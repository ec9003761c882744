//! Dimension tables: `date_dim` and `region_dim`.
//!
//! Dimension rows are created once by the reconcilers in `dramwh-reconcile`
//! and never updated afterwards; only a full reset removes them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{Column, ColumnType, EntityDescriptor, KeyKind, impl_entity};

// ─── DateDim ─────────────────────────────────────────────────────────────────

pub const DATE_DIM: EntityDescriptor = EntityDescriptor {
  table:    "date_dim",
  key_kind: KeyKind::Natural,
  columns:  &[
    Column::new("date", ColumnType::Date).not_null(),
    Column::new("year", ColumnType::Integer).not_null(),
    Column::new("quarter", ColumnType::Integer).not_null(),
    Column::new("month", ColumnType::Integer).not_null(),
    Column::new("week", ColumnType::Integer).not_null(),
    Column::new("day_of_week_num", ColumnType::Integer).not_null(),
    Column::new("day_of_week", ColumnType::Text(10)).not_null(),
  ],
};

/// One calendar day. Build with [`DateDim::for_date`] so the derived columns
/// stay consistent with the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateDim {
  pub date:            NaiveDate,
  pub year:            i32,
  /// 1–4.
  pub quarter:         i32,
  pub month:           i32,
  /// ISO 8601 week number.
  pub week:            i32,
  /// ISO weekday, Monday = 1 through Sunday = 7.
  pub day_of_week_num: i32,
  pub day_of_week:     String,
}

impl_entity!(DateDim, DATE_DIM, [
  date,
  year,
  quarter,
  month,
  week,
  day_of_week_num,
  day_of_week,
]);

// ─── RegionDim ───────────────────────────────────────────────────────────────

pub const REGION_DIM: EntityDescriptor = EntityDescriptor {
  table:    "region_dim",
  key_kind: KeyKind::Generated,
  columns:  &[
    Column::new("region_id", ColumnType::Integer).not_null(),
    Column::new("country_code", ColumnType::Text(10)).not_null().unique(),
    Column::new("country_name", ColumnType::Text(100)),
    Column::new("native_name", ColumnType::Text(100)),
    Column::new("phone_code", ColumnType::Text(50)),
    Column::new("continent_code", ColumnType::Text(2)),
    Column::new("continent_name", ColumnType::Text(50)).not_null(),
    Column::new("capital", ColumnType::Text(100)),
    Column::new("currency", ColumnType::Text(50)),
    Column::new("languages", ColumnType::Text(255)),
  ],
};

/// One country. `country_code` is the natural key; `region_id` is assigned
/// by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDim {
  pub region_id:      Option<i64>,
  pub country_code:   String,
  pub country_name:   Option<String>,
  pub native_name:    Option<String>,
  pub phone_code:     Option<String>,
  /// Absent when the continent name could not be resolved.
  pub continent_code: Option<String>,
  /// Always present; "Unknown" when the source left it blank.
  pub continent_name: String,
  pub capital:        Option<String>,
  pub currency:       Option<String>,
  /// Comma-separated language codes.
  pub languages:      Option<String>,
}

impl_entity!(RegionDim, REGION_DIM, [
  region_id,
  country_code,
  country_name,
  native_name,
  phone_code,
  continent_code,
  continent_name,
  capital,
  currency,
  languages,
]);
