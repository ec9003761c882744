//! Error type for `dramwh-store-postgres`.

use dramwh_core::store::StoreError;
use thiserror::Error;

/// SQLSTATE class 23: integrity constraint violation.
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dramwh_core::Error),

  #[error("configuration error: {0}")]
  Config(String),

  /// A UNIQUE, NOT NULL, CHECK or FOREIGN KEY constraint rejected a write.
  #[error("constraint violation: {0}")]
  ConstraintViolation(String),

  #[error("database error: {0}")]
  Database(#[source] tokio_postgres::Error),

  #[error("timed out waiting for a pooled connection")]
  PoolTimeout,

  #[error("column {table}.{column}: cannot bind {found} value")]
  Encode {
    table:  &'static str,
    column: &'static str,
    found:  &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<tokio_postgres::Error> for Error {
  fn from(err: tokio_postgres::Error) -> Self {
    if let Some(db) = err.as_db_error()
      && db.code().code().starts_with(INTEGRITY_CONSTRAINT_CLASS)
    {
      return Self::ConstraintViolation(db.message().to_owned());
    }
    Self::Database(err)
  }
}

impl From<bb8::RunError<tokio_postgres::Error>> for Error {
  fn from(err: bb8::RunError<tokio_postgres::Error>) -> Self {
    match err {
      bb8::RunError::User(err) => err.into(),
      bb8::RunError::TimedOut => Self::PoolTimeout,
    }
  }
}

impl StoreError for Error {
  fn is_constraint_violation(&self) -> bool {
    matches!(self, Self::ConstraintViolation(_))
  }
}
