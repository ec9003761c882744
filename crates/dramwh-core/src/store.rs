//! The `WarehouseStore` trait: entity-agnostic persistence.
//!
//! Implemented by storage backends (`dramwh-store-sqlite`,
//! `dramwh-store-postgres`). The reconcilers and the bootstrap binary depend
//! on this abstraction, not on a concrete backend.
//!
//! Every method runs as its own unit of work: it opens a transaction, does
//! its work, and commits or rolls back before the returned future resolves.

use std::future::Future;

use crate::{
  entity::Entity,
  value::{Fields, Value},
};

/// What `init_schema` does to existing tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaReset {
  /// Create missing tables; existing data is untouched.
  #[default]
  Keep,
  /// Drop every table and recreate it. All data is lost.
  DropAndRecreate,
}

impl SchemaReset {
  pub fn is_destructive(self) -> bool { self == Self::DropAndRecreate }
}

/// Classification shared by backend error types.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The store rejected a write on a unique, not-null or foreign-key
  /// constraint.
  fn is_constraint_violation(&self) -> bool;
}

/// Generic persistence over any [`Entity`].
///
/// All methods return `Send` futures so the trait can be driven from a
/// multi-threaded tokio runtime.
pub trait WarehouseStore: Send + Sync {
  type Error: StoreError;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Ensure every table exists, first dropping them all when `reset` is
  /// [`SchemaReset::DropAndRecreate`].
  fn init_schema(
    &self,
    reset: SchemaReset,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete every row of every table, children first, and restart identity
  /// counters. Atomic: either all tables are cleared or none is.
  fn truncate_all(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert one row and return it with store-assigned fields populated.
  fn add<E: Entity>(
    &self,
    entity: E,
  ) -> impl Future<Output = Result<E, Self::Error>> + Send + '_;

  /// Insert many rows in a single transaction. All-or-nothing; returns the
  /// number of rows written.
  fn add_all<E: Entity>(
    &self,
    entities: Vec<E>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert many rows in a single transaction, isolating each row under its
  /// own savepoint. A failing row is rolled back alone and reported in its
  /// slot; the rest are committed together.
  ///
  /// The outer error is reserved for failures of the transaction itself.
  fn add_each<E: Entity>(
    &self,
    entities: Vec<E>,
  ) -> impl Future<Output = Result<Vec<Result<E, Self::Error>>, Self::Error>> + Send + '_;

  /// Apply `changes` to the row with primary key `key` and return the
  /// refreshed row, or `None` if no row has that key.
  fn update<E: Entity>(
    &self,
    key: Value,
    changes: Fields,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Delete the row with primary key `key`; `true` if a row was removed.
  fn delete<E: Entity>(
    &self,
    key: Value,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Every row of `E`'s table, ordered by primary key.
  fn fetch_all<E: Entity>(&self) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Rows whose fields equal every value in `filter`. An empty filter
  /// returns the whole table; a `Null` value matches `IS NULL`.
  fn fetch_by<E: Entity>(
    &self,
    filter: Fields,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Maximum of `column` over `E`'s table; `None` when the table is empty.
  fn max_value<E: Entity>(
    &self,
    column: &'static str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + '_;
}
