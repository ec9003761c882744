//! Error type for `dramwh-store-sqlite`.

use dramwh_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dramwh_core::Error),

  /// A UNIQUE, NOT NULL, CHECK or FOREIGN KEY constraint rejected a write.
  #[error("constraint violation: {0}")]
  ConstraintViolation(String),

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[source] rusqlite::Error),

  #[error("column {table}.{column}: cannot decode {found}")]
  Decode {
    table:  &'static str,
    column: &'static str,
    found:  String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn constraint_message(err: &rusqlite::Error) -> Option<String> {
  match err {
    rusqlite::Error::SqliteFailure(failure, message)
      if failure.code == ErrorCode::ConstraintViolation =>
    {
      Some(message.clone().unwrap_or_else(|| failure.to_string()))
    }
    _ => None,
  }
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    match constraint_message(&err) {
      Some(message) => Self::ConstraintViolation(message),
      None => Self::Sqlite(err),
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match err {
      tokio_rusqlite::Error::Rusqlite(inner) => inner.into(),
      other => Self::Database(other),
    }
  }
}

impl StoreError for Error {
  fn is_constraint_violation(&self) -> bool {
    matches!(self, Self::ConstraintViolation(_))
  }
}
