//! Binding [`Value`]s to typed Postgres parameters and decoding result rows.
//!
//! Postgres is strictly typed, so every bind goes through the column's
//! declared [`ColumnType`]: `INTEGER` columns take `int4`, dates take
//! `date`, and so on. Nulls are bound as typed `None`s.

use chrono::NaiveDate;
use dramwh_core::{
  entity::{Column, ColumnType, EntityDescriptor, Record},
  Value,
};
use tokio_postgres::{types::ToSql, Row};

use crate::{Error, Result};

/// One owned statement parameter.
pub type Param = Box<dyn ToSql + Send + Sync>;

/// Convert one value to a parameter typed for `column`.
pub fn param(
  descriptor: &'static EntityDescriptor,
  column: &'static Column,
  value: Value,
) -> Result<Param> {
  let mismatch = |value: &Value| Error::Encode {
    table:  descriptor.table,
    column: column.name,
    found:  value.kind(),
  };

  let param: Param = match (column.ty, value) {
    (ColumnType::Integer, Value::Null) => Box::new(None::<i32>),
    (ColumnType::Integer, Value::Integer(i)) => {
      let i = i32::try_from(i).map_err(|_| mismatch(&Value::Integer(i)))?;
      Box::new(Some(i))
    }
    (ColumnType::Real, Value::Null) => Box::new(None::<f64>),
    (ColumnType::Real, Value::Real(r)) => Box::new(Some(r)),
    (ColumnType::Real, Value::Integer(i)) => Box::new(Some(i as f64)),
    (ColumnType::Text(_), Value::Null) => Box::new(None::<String>),
    (ColumnType::Text(_), Value::Text(s)) => Box::new(Some(s)),
    (ColumnType::Date, Value::Null) => Box::new(None::<NaiveDate>),
    (ColumnType::Date, Value::Date(d)) => Box::new(Some(d)),
    (_, other) => return Err(mismatch(&other)),
  };
  Ok(param)
}

/// Typed parameters for `params`, in order. Each entry names the column
/// position it is bound against.
pub fn params(
  descriptor: &'static EntityDescriptor,
  params: Vec<(usize, Value)>,
) -> Result<Vec<Param>> {
  params
    .into_iter()
    .map(|(pos, value)| param(descriptor, &descriptor.columns[pos], value))
    .collect()
}

/// Borrow owned parameters in the shape the driver's query methods take.
pub fn as_refs(params: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
  params
    .iter()
    .map(|p| p.as_ref() as &(dyn ToSql + Sync))
    .collect()
}

/// Decode result column `index` of `row` as `column`'s type.
pub fn decode_column(column: &'static Column, row: &Row, index: usize) -> Result<Value> {
  let value = match column.ty {
    ColumnType::Integer => row
      .try_get::<_, Option<i32>>(index)?
      .map(|i| Value::Integer(i.into())),
    ColumnType::Real => row.try_get::<_, Option<f64>>(index)?.map(Value::Real),
    ColumnType::Text(_) => row.try_get::<_, Option<String>>(index)?.map(Value::Text),
    ColumnType::Date => row.try_get::<_, Option<NaiveDate>>(index)?.map(Value::Date),
  };
  Ok(value.unwrap_or(Value::Null))
}

/// Decode a full-width row selected with the descriptor's column list.
pub fn decode_row(descriptor: &'static EntityDescriptor, row: &Row) -> Result<Record> {
  let values = descriptor
    .columns
    .iter()
    .enumerate()
    .map(|(i, column)| decode_column(column, row, i))
    .collect::<Result<Vec<_>>>()?;
  Ok(Record::new(descriptor, values)?)
}

#[cfg(test)]
mod tests {
  use dramwh_core::{dimension::DATE_DIM, fact::DRAM_PRICES};

  use super::*;

  #[test]
  fn text_into_integer_column_is_rejected() {
    let year = DATE_DIM.column("year").unwrap();
    let err = param(&DATE_DIM, year, Value::Text("2024".into())).err().unwrap();
    assert!(matches!(err, Error::Encode { column: "year", found: "text", .. }));
  }

  #[test]
  fn out_of_range_integer_is_rejected() {
    let id = DRAM_PRICES.key();
    let err = param(&DRAM_PRICES, id, Value::Integer(i64::MAX)).err().unwrap();
    assert!(matches!(err, Error::Encode { table: "dram_prices", .. }));
  }

  #[test]
  fn nulls_and_widened_reals_bind() {
    let bound = params(&DRAM_PRICES, vec![
      (3, Value::Integer(4)),
      (4, Value::Null),
      (1, Value::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())),
    ])
    .unwrap();
    assert_eq!(as_refs(&bound).len(), 3);
  }

  #[test]
  fn first_bad_param_fails_the_set() {
    let err = params(&DRAM_PRICES, vec![(2, "DDR5".into()), (3, "cheap".into())])
      .err()
      .unwrap();
    assert!(matches!(err, Error::Encode { column: "price_usd", found: "text", .. }));
  }
}
