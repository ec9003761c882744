//! Error types for `dramwh-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("table {table} has no column named {field:?}")]
  UnknownField { table: &'static str, field: String },

  #[error("key column {table}.{field} cannot be updated")]
  KeyNotUpdatable { table: &'static str, field: &'static str },

  #[error("column {table}.{column}: expected {expected}, found {found}")]
  Decode {
    table:    &'static str,
    column:   &'static str,
    expected: &'static str,
    found:    String,
  },

  #[error("record for {table} has {found} values, expected {expected}")]
  Arity {
    table:    &'static str,
    expected: usize,
    found:    usize,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
