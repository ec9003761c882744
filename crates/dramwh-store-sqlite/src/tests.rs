//! Integration tests for `SqliteWarehouse` against an in-memory database.

use chrono::NaiveDate;
use dramwh_core::{
  dimension::{DateDim, RegionDim},
  fact::{DramPrices, MacroIndicators, SmartphoneShipments},
  store::{SchemaReset, StoreError as _, WarehouseStore},
  Fields, Value,
};

use crate::{Error, SqliteWarehouse};

async fn store() -> SqliteWarehouse {
  let s = SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory store");
  s.init_schema(SchemaReset::Keep).await.expect("schema");
  s
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, d).unwrap() }

async fn seed_days(s: &SqliteWarehouse, days: impl IntoIterator<Item = u32>) {
  let rows: Vec<DateDim> = days.into_iter().map(|d| DateDim::for_date(day(d))).collect();
  s.add_all(rows).await.unwrap();
}

fn region(code: &str) -> RegionDim {
  RegionDim {
    region_id:      None,
    country_code:   code.into(),
    country_name:   Some(format!("Country {code}")),
    native_name:    None,
    phone_code:     None,
    continent_code: Some("EU".into()),
    continent_name: "Europe".into(),
    capital:        None,
    currency:       None,
    languages:      None,
  }
}

// ─── Insert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_assigns_surrogate_key() {
  let s = store().await;
  seed_days(&s, [15]).await;

  let first = s.add(DramPrices::new(day(15), "DDR5", 3.5)).await.unwrap();
  let second = s.add(DramPrices::new(day(15), "DDR4", 1.9)).await.unwrap();

  assert_eq!(first.id, Some(1));
  assert_eq!(second.id, Some(2));
  assert_eq!(first.source.as_deref(), Some("manual"));
  assert_eq!(first.date, day(15));
}

#[tokio::test]
async fn unset_source_takes_the_column_default() {
  let s = store().await;
  seed_days(&s, [15]).await;

  let price = s
    .add(DramPrices {
      source: None,
      ..DramPrices::new(day(15), "DDR5", 3.5)
    })
    .await
    .unwrap();
  assert_eq!(price.source.as_deref(), Some("manual"));

  let named = s
    .add(DramPrices {
      source: Some("TrendForce".into()),
      ..DramPrices::new(day(15), "DDR4", 1.9)
    })
    .await
    .unwrap();
  assert_eq!(named.source.as_deref(), Some("TrendForce"));
}

#[tokio::test]
async fn add_natural_key_round_trips() {
  let s = store().await;
  let row = s.add(DateDim::for_date(day(15))).await.unwrap();
  assert_eq!(row, DateDim::for_date(day(15)));

  let all: Vec<DateDim> = s.fetch_all().await.unwrap();
  assert_eq!(all, vec![row]);
}

#[tokio::test]
async fn duplicate_natural_key_is_constraint_violation() {
  let s = store().await;
  s.add(DateDim::for_date(day(15))).await.unwrap();

  let err = s.add(DateDim::for_date(day(15))).await.unwrap_err();
  assert!(err.is_constraint_violation(), "{err}");
}

#[tokio::test]
async fn fact_without_date_row_is_rejected() {
  let s = store().await;

  let err = s
    .add(DramPrices::new(day(1), "DDR5", 3.5))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ConstraintViolation(_)));

  let prices: Vec<DramPrices> = s.fetch_all().await.unwrap();
  assert!(prices.is_empty());
}

#[tokio::test]
async fn add_all_is_all_or_nothing() {
  let s = store().await;
  seed_days(&s, [1]).await;

  let err = s
    .add_all(vec![DateDim::for_date(day(2)), DateDim::for_date(day(1))])
    .await
    .unwrap_err();
  assert!(err.is_constraint_violation());

  let days: Vec<DateDim> = s.fetch_all().await.unwrap();
  assert_eq!(days.len(), 1, "day 2 must have been rolled back");
}

#[tokio::test]
async fn add_each_isolates_failing_rows() {
  let s = store().await;

  let outcomes = s
    .add_each(vec![region("US"), region("DE"), region("US"), region("FR")])
    .await
    .unwrap();

  assert_eq!(outcomes.len(), 4);
  assert!(outcomes[0].is_ok());
  assert!(outcomes[1].is_ok());
  assert!(matches!(outcomes[2], Err(Error::ConstraintViolation(_))));
  assert!(outcomes[3].is_ok());

  let codes: Vec<String> = s
    .fetch_all::<RegionDim>()
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.country_code)
    .collect();
  assert_eq!(codes, vec!["US", "DE", "FR"]);
}

// ─── Update / delete ─────────────────────────────────────────────────────────

#[tokio::test]
async fn update_applies_changes_and_refreshes() {
  let s = store().await;
  seed_days(&s, [15]).await;
  let price = s.add(DramPrices::new(day(15), "DDR5", 3.5)).await.unwrap();

  let updated: DramPrices = s
    .update(
      Value::from(price.id),
      Fields::new().with("price_usd", 4.25).with("source", "trendforce"),
    )
    .await
    .unwrap()
    .expect("row exists");

  assert_eq!(updated.id, price.id);
  assert_eq!(updated.price_usd, 4.25);
  assert_eq!(updated.source.as_deref(), Some("trendforce"));
  assert_eq!(updated.dram_type, "DDR5");
}

#[tokio::test]
async fn update_missing_key_returns_none() {
  let s = store().await;
  let result = s
    .update::<DramPrices>(Value::Integer(42), Fields::new().with("price_usd", 1.0))
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn update_rejects_unknown_field_and_key() {
  let s = store().await;

  let err = s
    .update::<DramPrices>(Value::Integer(1), Fields::new().with("colour", "red"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(dramwh_core::Error::UnknownField { .. })));

  let err = s
    .update::<DramPrices>(Value::Integer(1), Fields::new().with("id", 2_i64))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(dramwh_core::Error::KeyNotUpdatable { .. })));
}

#[tokio::test]
async fn update_violating_fk_rolls_back() {
  let s = store().await;
  seed_days(&s, [15]).await;
  let price = s.add(DramPrices::new(day(15), "DDR5", 3.5)).await.unwrap();

  let err = s
    .update::<DramPrices>(Value::from(price.id), Fields::new().with("date", day(20)))
    .await
    .unwrap_err();
  assert!(err.is_constraint_violation());

  let stored: Vec<DramPrices> = s.fetch_all().await.unwrap();
  assert_eq!(stored[0].date, day(15));
}

#[tokio::test]
async fn delete_reports_whether_a_row_was_removed() {
  let s = store().await;
  seed_days(&s, [15]).await;
  let price = s.add(DramPrices::new(day(15), "DDR5", 3.5)).await.unwrap();

  assert!(s.delete::<DramPrices>(Value::from(price.id)).await.unwrap());
  assert!(!s.delete::<DramPrices>(Value::from(price.id)).await.unwrap());
  assert!(s.fetch_all::<DramPrices>().await.unwrap().is_empty());
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_by_ands_fields() {
  let s = store().await;
  seed_days(&s, [14, 15]).await;
  s.add(DramPrices::new(day(14), "DDR5", 3.4)).await.unwrap();
  s.add(DramPrices::new(day(15), "DDR5", 3.5)).await.unwrap();
  s.add(DramPrices::new(day(15), "DDR4", 1.9)).await.unwrap();

  let both: Vec<DramPrices> = s
    .fetch_by(Fields::new().with("dram_type", "DDR5").with("date", day(15)))
    .await
    .unwrap();
  assert_eq!(both.len(), 1);
  assert_eq!(both[0].price_usd, 3.5);

  let ddr5: Vec<DramPrices> = s
    .fetch_by(Fields::new().with("dram_type", "DDR5"))
    .await
    .unwrap();
  assert_eq!(ddr5.len(), 2);
}

#[tokio::test]
async fn empty_filter_equals_fetch_all() {
  let s = store().await;
  seed_days(&s, [14, 15, 16]).await;

  let all: Vec<DateDim> = s.fetch_all().await.unwrap();
  let filtered: Vec<DateDim> = s.fetch_by(Fields::new()).await.unwrap();
  assert_eq!(all.len(), 3);
  assert_eq!(all, filtered);
}

#[tokio::test]
async fn null_filter_matches_is_null() {
  let s = store().await;
  seed_days(&s, [15]).await;
  let us = s.add(region("US")).await.unwrap();

  for region_id in [None, us.region_id] {
    s.add(MacroIndicators {
      id: None,
      date: day(15),
      indicator: Some("CPI".into()),
      value: Some(3.1),
      region_id,
    })
    .await
    .unwrap();
  }

  let global: Vec<MacroIndicators> = s
    .fetch_by(Fields::new().with("region_id", Value::Null))
    .await
    .unwrap();
  assert_eq!(global.len(), 1);
  assert_eq!(global[0].region_id, None);
}

#[tokio::test]
async fn fetch_by_unknown_field_errors() {
  let s = store().await;
  let err = s
    .fetch_by::<DateDim>(Fields::new().with("fiscal_year", 2024))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(dramwh_core::Error::UnknownField { .. })));
}

#[tokio::test]
async fn max_value_decodes_column_type() {
  let s = store().await;
  assert_eq!(s.max_value::<DateDim>("date").await.unwrap(), None);

  seed_days(&s, [3, 9, 5]).await;
  assert_eq!(
    s.max_value::<DateDim>("date").await.unwrap(),
    Some(Value::Date(day(9)))
  );
}

// ─── Reset ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn truncate_all_empties_tables_and_restarts_keys() {
  let s = store().await;
  seed_days(&s, [15]).await;
  let us = s.add(region("US")).await.unwrap();
  s.add(SmartphoneShipments {
    id: None,
    date: day(15),
    brand: Some("Acme".into()),
    region_id: us.region_id,
    shipments_million_units: Some(12.0),
  })
  .await
  .unwrap();
  s.add(DramPrices::new(day(15), "DDR5", 3.5)).await.unwrap();

  s.truncate_all().await.unwrap();

  assert!(s.fetch_all::<DateDim>().await.unwrap().is_empty());
  assert!(s.fetch_all::<RegionDim>().await.unwrap().is_empty());
  assert!(s.fetch_all::<SmartphoneShipments>().await.unwrap().is_empty());
  assert!(s.fetch_all::<DramPrices>().await.unwrap().is_empty());

  seed_days(&s, [15]).await;
  let price = s.add(DramPrices::new(day(15), "DDR5", 3.5)).await.unwrap();
  let de = s.add(region("DE")).await.unwrap();
  assert_eq!(price.id, Some(1));
  assert_eq!(de.region_id, Some(1));
}

#[tokio::test]
async fn init_schema_keep_preserves_and_reset_destroys() {
  let s = store().await;
  seed_days(&s, [15]).await;

  s.init_schema(SchemaReset::Keep).await.unwrap();
  assert_eq!(s.fetch_all::<DateDim>().await.unwrap().len(), 1);

  s.init_schema(SchemaReset::DropAndRecreate).await.unwrap();
  assert!(s.fetch_all::<DateDim>().await.unwrap().is_empty());

  // Recreated tables are fully usable.
  seed_days(&s, [16]).await;
  assert_eq!(s.fetch_all::<DateDim>().await.unwrap().len(), 1);
}
