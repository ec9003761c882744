//! [`PgWarehouse`]: the Postgres implementation of [`WarehouseStore`].

use bb8_postgres::PostgresConnectionManager;
use dramwh_core::{
  entity::{Entity, EntityDescriptor},
  schema,
  store::{SchemaReset, WarehouseStore},
  Fields, Value,
};
use tokio_postgres::{Row, Transaction};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, info, warn};

use crate::{
  config::{tls_connector, PostgresConfig},
  encode::{as_refs, decode_column, decode_row, params},
  schema::{create_all, drop_all},
  sql, Result,
};

/// The connection pool behind a [`PgWarehouse`].
pub type PgPool = bb8::Pool<PostgresConnectionManager<MakeRustlsConnect>>;

/// Log a statement under the `dramwh::sql` target.
fn echo(sql: &str) {
  debug!(target: "dramwh::sql", "{sql}");
}

/// An entity's INSERT statement and its positional parameters.
fn prepare_insert<E: Entity>(entity: &E) -> (String, Vec<(usize, Value)>) {
  let record = entity.to_record();
  let positions = E::DESCRIPTOR.insert_positions(&record);
  let sql = sql::insert_returning(E::DESCRIPTOR, &positions);
  let params = positions
    .iter()
    .map(|p| (*p, record.values()[*p].clone()))
    .collect();
  (sql, params)
}

fn decode<E: Entity>(row: &Row) -> Result<E> {
  Ok(E::from_record(decode_row(E::DESCRIPTOR, row)?)?)
}

async fn insert_one<E: Entity>(
  tx: &Transaction<'_>,
  sql: &str,
  bound: Vec<(usize, Value)>,
) -> Result<E> {
  echo(sql);
  let bound = params(E::DESCRIPTOR, bound)?;
  let row = tx.query_one(sql, &as_refs(&bound)).await?;
  decode(&row)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A warehouse backed by a pooled Postgres connection.
#[derive(Clone)]
pub struct PgWarehouse {
  pool: PgPool,
}

impl PgWarehouse {
  /// Connect using `config`. One connection is opened up front so a server
  /// that refuses TLS or channel binding fails here rather than on first
  /// use. Tables are created by [`WarehouseStore::init_schema`], not here.
  pub async fn connect(config: &PostgresConfig) -> Result<Self> {
    info!(url = %config.redacted_url(), "connecting to postgres");
    let pg = config.pg_config()?;
    let tls = tls_connector()?;

    let (client, connection) = pg.connect(tls.clone()).await?;
    tokio::spawn(connection);
    drop(client);

    let manager = PostgresConnectionManager::new(pg, tls);
    let pool = bb8::Pool::builder()
      .max_size(config.max_connections)
      .build(manager)
      .await?;
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self { Self { pool } }

  pub fn pool(&self) -> &PgPool { &self.pool }

  async fn select<E: Entity>(&self, sql: String, bound: Vec<(usize, Value)>) -> Result<Vec<E>> {
    let bound = params(E::DESCRIPTOR, bound)?;
    let conn = self.pool.get().await?;
    echo(&sql);
    let rows = conn.query(&sql, &as_refs(&bound)).await?;
    rows.iter().map(decode::<E>).collect()
  }
}

// ─── WarehouseStore impl ─────────────────────────────────────────────────────

impl WarehouseStore for PgWarehouse {
  type Error = crate::Error;

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn init_schema(&self, reset: SchemaReset) -> Result<()> {
    if reset.is_destructive() {
      warn!(tables = schema::TABLES.len(), "dropping and recreating every warehouse table");
    }

    let mut conn = self.pool.get().await?;
    let tx = conn.transaction().await?;
    if reset.is_destructive() {
      for stmt in drop_all() {
        echo(&stmt);
        tx.batch_execute(&stmt).await?;
      }
    }
    for stmt in create_all() {
      echo(&stmt);
      tx.batch_execute(&stmt).await?;
    }
    tx.commit().await?;

    info!(?reset, "schema initialised");
    Ok(())
  }

  async fn truncate_all(&self) -> Result<()> {
    let stmt = crate::schema::truncate_all();

    let mut conn = self.pool.get().await?;
    let tx = conn.transaction().await?;
    echo(&stmt);
    tx.batch_execute(&stmt).await?;
    tx.commit().await?;

    info!("all tables truncated");
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn add<E: Entity>(&self, entity: E) -> Result<E> {
    let (sql, bound) = prepare_insert(&entity);

    let mut conn = self.pool.get().await?;
    let tx = conn.transaction().await?;
    let row = insert_one::<E>(&tx, &sql, bound).await?;
    tx.commit().await?;
    Ok(row)
  }

  async fn add_all<E: Entity>(&self, entities: Vec<E>) -> Result<usize> {
    let rows: Vec<(String, Vec<(usize, Value)>)> = entities.iter().map(prepare_insert).collect();
    let written = rows.len();

    let mut conn = self.pool.get().await?;
    let tx = conn.transaction().await?;
    for (sql, bound) in rows {
      insert_one::<E>(&tx, &sql, bound).await?;
    }
    tx.commit().await?;

    debug!(table = E::DESCRIPTOR.table, written, "bulk insert committed");
    Ok(written)
  }

  async fn add_each<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<Result<E>>> {
    let rows: Vec<(String, Vec<(usize, Value)>)> = entities.iter().map(prepare_insert).collect();

    let mut conn = self.pool.get().await?;
    let mut tx = conn.transaction().await?;
    let mut outcomes = Vec::with_capacity(rows.len());
    for (sql, bound) in rows {
      // A nested transaction is a savepoint.
      let sp = tx.transaction().await?;
      match insert_one::<E>(&sp, &sql, bound).await {
        Ok(row) => {
          sp.commit().await?;
          outcomes.push(Ok(row));
        }
        Err(err) => {
          sp.rollback().await?;
          outcomes.push(Err(err));
        }
      }
    }
    tx.commit().await?;

    Ok(outcomes)
  }

  async fn update<E: Entity>(&self, key: Value, changes: Fields) -> Result<Option<E>> {
    let descriptor: &'static EntityDescriptor = E::DESCRIPTOR;
    let mut changes = descriptor.resolve_changes(&changes)?;
    let positions: Vec<usize> = changes.iter().map(|(pos, _)| *pos).collect();
    let select_sql = sql::select_by_key(descriptor);
    let by_key = params(descriptor, vec![(0, key.clone())])?;

    let mut conn = self.pool.get().await?;
    let tx = conn.transaction().await?;
    echo(&select_sql);
    if tx.query_opt(&select_sql, &as_refs(&by_key)).await?.is_none() {
      return Ok(None);
    }

    if !positions.is_empty() {
      let update_sql = sql::update_by_key(descriptor, &positions);
      changes.push((0, key));
      let bound = params(descriptor, changes)?;
      echo(&update_sql);
      tx.execute(&update_sql, &as_refs(&bound)).await?;
    }

    let refreshed = tx.query_one(&select_sql, &as_refs(&by_key)).await?;
    tx.commit().await?;

    decode(&refreshed).map(Some)
  }

  async fn delete<E: Entity>(&self, key: Value) -> Result<bool> {
    let stmt = sql::delete_by_key(E::DESCRIPTOR);
    let bound = params(E::DESCRIPTOR, vec![(0, key)])?;

    let mut conn = self.pool.get().await?;
    let tx = conn.transaction().await?;
    echo(&stmt);
    let removed = tx.execute(&stmt, &as_refs(&bound)).await?;
    tx.commit().await?;

    Ok(removed > 0)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn fetch_all<E: Entity>(&self) -> Result<Vec<E>> {
    self.select(sql::select_all(E::DESCRIPTOR), Vec::new()).await
  }

  async fn fetch_by<E: Entity>(&self, filter: Fields) -> Result<Vec<E>> {
    let filter = E::DESCRIPTOR.resolve(&filter)?;
    let (stmt, bound) = sql::select_where(E::DESCRIPTOR, &filter);
    let bound = bound.iter().map(|i| filter[*i].clone()).collect();
    self.select(stmt, bound).await
  }

  async fn max_value<E: Entity>(&self, column: &'static str) -> Result<Option<Value>> {
    let descriptor: &'static EntityDescriptor = E::DESCRIPTOR;
    let pos = descriptor.require(column)?;
    let stmt = sql::max_of(descriptor, column);

    let conn = self.pool.get().await?;
    echo(&stmt);
    let row = conn.query_one(&stmt, &[]).await?;
    let value = decode_column(&descriptor.columns[pos], &row, 0)?;
    Ok((!value.is_null()).then_some(value))
  }
}
