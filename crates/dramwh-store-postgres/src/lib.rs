//! Postgres backend for the dramwh warehouse.
//!
//! The production store. Connections are pooled with [`bb8`] over
//! [`tokio_postgres`] and always negotiated over TLS with SCRAM channel
//! binding; see [`PostgresConfig`].

mod encode;
mod schema;
mod sql;
mod store;

pub mod config;
pub mod error;

pub use config::PostgresConfig;
pub use error::{Error, Result};
pub use store::{PgPool, PgWarehouse};
