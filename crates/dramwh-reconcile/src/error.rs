//! Error type for `dramwh-reconcile`.

use dramwh_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The backing store failed outside of a per-row insert.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The country feed could not be fetched or parsed.
  #[error("region feed {origin}: {reason}")]
  ExternalFetch { origin: String, reason: String },

  #[error("configuration error: {0}")]
  Config(String),

  /// The store handed back a value of the wrong type for a column.
  #[error("{table}.{column}: expected {expected}, found {found}")]
  UnexpectedValue {
    table:    &'static str,
    column:   &'static str,
    expected: &'static str,
    found:    &'static str,
  },
}

impl Error {
  pub fn store<E: StoreError>(err: E) -> Self { Self::Store(Box::new(err)) }

  pub(crate) fn fetch(origin: &str, reason: impl ToString) -> Self {
    Self::ExternalFetch {
      origin: origin.to_owned(),
      reason: reason.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
