//! [`SqliteWarehouse`]: the SQLite implementation of [`WarehouseStore`].

use std::path::Path;

use dramwh_core::{
  entity::{Entity, EntityDescriptor},
  schema,
  store::{SchemaReset, WarehouseStore},
  Fields, Value,
};
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value as SqlValue};
use tracing::{debug, info, warn};

use crate::{
  encode::{decode_row, from_sql, read_raw, to_sql},
  schema::{create_all, drop_all, PRAGMAS},
  sql, Error, Result,
};

/// Log a statement under the `dramwh::sql` target.
fn echo(sql: &str) {
  debug!(target: "dramwh::sql", "{sql}");
}

/// Run one `INSERT ... RETURNING` and read back the full row.
fn insert_one(
  conn: &rusqlite::Connection,
  sql: &str,
  params: &[SqlValue],
  width: usize,
) -> rusqlite::Result<Vec<SqlValue>> {
  echo(sql);
  conn
    .prepare_cached(sql)?
    .query_row(params_from_iter(params.iter()), |row| read_raw(row, width))
}

/// An entity's INSERT statement and its bound values.
fn prepare_insert<E: Entity>(entity: &E) -> (String, Vec<SqlValue>) {
  let record = entity.to_record();
  let positions = E::DESCRIPTOR.insert_positions(&record);
  let sql = sql::insert_returning(E::DESCRIPTOR, &positions);
  let params = positions.iter().map(|p| to_sql(&record.values()[*p])).collect();
  (sql, params)
}

fn decode<E: Entity>(raw: Vec<SqlValue>) -> Result<E> {
  Ok(E::from_record(decode_row(E::DESCRIPTOR, raw)?)?)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A warehouse backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a database at `path`. Tables are created by
  /// [`WarehouseStore::init_schema`], not here.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.configure().await?;
    Ok(store)
  }

  /// Open an in-memory database, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.configure().await?;
    Ok(store)
  }

  async fn configure(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select<E: Entity>(&self, sql: String, params: Vec<SqlValue>) -> Result<Vec<E>> {
    let width = E::DESCRIPTOR.columns.len();
    let raws: Vec<Vec<SqlValue>> = self
      .conn
      .call(move |conn| {
        echo(&sql);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params.iter()), |row| read_raw(row, width))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(decode::<E>).collect()
  }
}

// ─── WarehouseStore impl ─────────────────────────────────────────────────────

impl WarehouseStore for SqliteWarehouse {
  type Error = Error;

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn init_schema(&self, reset: SchemaReset) -> Result<()> {
    if reset.is_destructive() {
      warn!(tables = schema::TABLES.len(), "dropping and recreating every warehouse table");
    }

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if reset.is_destructive() {
          for stmt in drop_all() {
            echo(&stmt);
            tx.execute(&stmt, [])?;
          }
        }
        for stmt in create_all() {
          echo(&stmt);
          tx.execute(&stmt, [])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    info!(?reset, "schema initialised");
    Ok(())
  }

  async fn truncate_all(&self) -> Result<()> {
    let tables: Vec<&'static str> = schema::children_first().map(|d| d.table).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for table in &tables {
          let stmt = format!("DELETE FROM {table}");
          echo(&stmt);
          tx.execute(&stmt, [])?;
        }

        // `sqlite_sequence` only exists once an AUTOINCREMENT table has been
        // created.
        let has_sequences = tx
          .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
            [],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if has_sequences {
          let placeholders = vec!["?"; tables.len()].join(", ");
          let stmt = format!("DELETE FROM sqlite_sequence WHERE name IN ({placeholders})");
          echo(&stmt);
          tx.execute(&stmt, params_from_iter(tables.iter()))?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    info!("all tables truncated");
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn add<E: Entity>(&self, entity: E) -> Result<E> {
    let (sql, params) = prepare_insert(&entity);
    let width = E::DESCRIPTOR.columns.len();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = insert_one(&tx, &sql, &params, width)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    decode(raw)
  }

  async fn add_all<E: Entity>(&self, entities: Vec<E>) -> Result<usize> {
    let rows: Vec<(String, Vec<SqlValue>)> = entities.iter().map(prepare_insert).collect();
    let width = E::DESCRIPTOR.columns.len();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (sql, params) in &rows {
          insert_one(&tx, sql, params, width)?;
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    debug!(table = E::DESCRIPTOR.table, written, "bulk insert committed");
    Ok(written)
  }

  async fn add_each<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<Result<E>>> {
    let rows: Vec<(String, Vec<SqlValue>)> = entities.iter().map(prepare_insert).collect();
    let width = E::DESCRIPTOR.columns.len();

    let outcomes = self
      .conn
      .call(move |conn| {
        let mut tx = conn.transaction()?;
        let mut outcomes = Vec::with_capacity(rows.len());
        for (sql, params) in &rows {
          let sp = tx.savepoint()?;
          match insert_one(&sp, sql, params, width) {
            Ok(raw) => {
              sp.commit()?;
              outcomes.push(Ok(raw));
            }
            // Dropping the savepoint rolls back this row only.
            Err(err) => outcomes.push(Err(err)),
          }
        }
        tx.commit()?;
        Ok(outcomes)
      })
      .await?;

    Ok(
      outcomes
        .into_iter()
        .map(|outcome| outcome.map_err(Error::from).and_then(decode::<E>))
        .collect(),
    )
  }

  async fn update<E: Entity>(&self, key: Value, changes: Fields) -> Result<Option<E>> {
    let descriptor: &'static EntityDescriptor = E::DESCRIPTOR;
    let changes = descriptor.resolve_changes(&changes)?;
    let positions: Vec<usize> = changes.iter().map(|(pos, _)| *pos).collect();

    let select_sql = sql::select_by_key(descriptor);
    let update_sql = sql::update_by_key(descriptor, &positions);
    let key = to_sql(&key);
    let mut params: Vec<SqlValue> = changes.iter().map(|(_, v)| to_sql(v)).collect();
    params.push(key.clone());
    let width = descriptor.columns.len();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        echo(&select_sql);
        let existing = tx
          .query_row(&select_sql, [&key], |row| read_raw(row, width))
          .optional()?;
        if existing.is_none() {
          return Ok(None);
        }

        if !positions.is_empty() {
          echo(&update_sql);
          tx.execute(&update_sql, params_from_iter(params.iter()))?;
        }

        let refreshed = tx.query_row(&select_sql, [&key], |row| read_raw(row, width))?;
        tx.commit()?;
        Ok(Some(refreshed))
      })
      .await?;

    raw.map(decode::<E>).transpose()
  }

  async fn delete<E: Entity>(&self, key: Value) -> Result<bool> {
    let stmt = sql::delete_by_key(E::DESCRIPTOR);
    let key = to_sql(&key);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        echo(&stmt);
        let removed = tx.execute(&stmt, [&key])?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    Ok(removed > 0)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn fetch_all<E: Entity>(&self) -> Result<Vec<E>> {
    self.select(sql::select_all(E::DESCRIPTOR), Vec::new()).await
  }

  async fn fetch_by<E: Entity>(&self, filter: Fields) -> Result<Vec<E>> {
    let filter = E::DESCRIPTOR.resolve(&filter)?;
    let (stmt, bound) = sql::select_where(E::DESCRIPTOR, &filter);
    let params = bound.iter().map(|i| to_sql(&filter[*i].1)).collect();
    self.select(stmt, params).await
  }

  async fn max_value<E: Entity>(&self, column: &'static str) -> Result<Option<Value>> {
    let descriptor: &'static EntityDescriptor = E::DESCRIPTOR;
    let pos = descriptor.require(column)?;
    let stmt = sql::max_of(descriptor, column);

    let raw: SqlValue = self
      .conn
      .call(move |conn| {
        echo(&stmt);
        Ok(conn.query_row(&stmt, [], |row| row.get(0))?)
      })
      .await?;

    let value = from_sql(descriptor, &descriptor.columns[pos], raw)?;
    Ok((!value.is_null()).then_some(value))
  }
}
