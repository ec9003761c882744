//! Conversion between [`Value`]s and SQLite storage values.
//!
//! Dates are stored as ISO 8601 `TEXT` (`YYYY-MM-DD`), which also makes
//! `MAX(date)` and `ORDER BY date` sort chronologically.

use chrono::NaiveDate;
use dramwh_core::{
  entity::{Column, ColumnType, EntityDescriptor, Record},
  Value,
};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn to_sql(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Integer(i) => SqlValue::Integer(*i),
    Value::Real(r) => SqlValue::Real(*r),
    Value::Text(s) => SqlValue::Text(s.clone()),
    Value::Date(d) => SqlValue::Text(d.format(DATE_FORMAT).to_string()),
  }
}

pub fn from_sql(
  descriptor: &'static EntityDescriptor,
  column: &'static Column,
  raw: SqlValue,
) -> Result<Value> {
  let decode_err = |found: String| Error::Decode {
    table: descriptor.table,
    column: column.name,
    found,
  };

  match (column.ty, raw) {
    (_, SqlValue::Null) => Ok(Value::Null),
    (ColumnType::Integer, SqlValue::Integer(i)) => Ok(Value::Integer(i)),
    (ColumnType::Real, SqlValue::Real(r)) => Ok(Value::Real(r)),
    (ColumnType::Real, SqlValue::Integer(i)) => Ok(Value::Real(i as f64)),
    (ColumnType::Text(_), SqlValue::Text(s)) => Ok(Value::Text(s)),
    (ColumnType::Date, SqlValue::Text(s)) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
      .map(Value::Date)
      .map_err(|e| decode_err(format!("{s:?} ({e})"))),
    (_, other) => Err(decode_err(format!("{other:?}"))),
  }
}

/// Raw column values of one result row, in select order.
pub fn read_raw(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<SqlValue>> {
  (0..width).map(|i| row.get::<_, SqlValue>(i)).collect()
}

/// Decode a full-width row selected with the descriptor's column list.
pub fn decode_row(descriptor: &'static EntityDescriptor, raw: Vec<SqlValue>) -> Result<Record> {
  let values = descriptor
    .columns
    .iter()
    .zip(raw)
    .map(|(column, value)| from_sql(descriptor, column, value))
    .collect::<Result<Vec<_>>>()?;
  Ok(Record::new(descriptor, values)?)
}
