//! Connection settings for the production Postgres warehouse.
//!
//! Every connection requires TLS and SCRAM channel binding. A server that
//! cannot offer both is refused during the handshake; there is no fallback
//! to a weaker mode.

use std::{fmt, sync::Arc};

use rustls::{ClientConfig, RootCertStore};
use serde::Deserialize;
use tokio_postgres::config::{ChannelBinding, Config, SslMode};
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::{Error, Result};

fn default_max_connections() -> u32 { 5 }

/// Discrete connection parameters, normally read from `DB_*` environment
/// variables. Constructed once and handed to
/// [`PgWarehouse::connect`](crate::PgWarehouse::connect).
#[derive(Clone, Deserialize)]
pub struct PostgresConfig {
  pub user:            String,
  pub password:        String,
  /// `host` or `host:port`.
  pub host:            String,
  /// Database name.
  pub name:            String,
  #[serde(default = "default_max_connections")]
  pub max_connections: u32,
}

impl PostgresConfig {
  /// libpq-style URL requiring TLS and channel binding.
  pub fn connection_url(&self) -> String {
    self.url_with_password(&self.password)
  }

  /// [`connection_url`](Self::connection_url) with the password masked, for
  /// logs.
  pub fn redacted_url(&self) -> String { self.url_with_password("****") }

  fn url_with_password(&self, password: &str) -> String {
    format!(
      "postgresql://{}:{}@{}/{}?sslmode=require&channel_binding=require",
      self.user, password, self.host, self.name
    )
  }

  fn host_and_port(&self) -> Result<(&str, Option<u16>)> {
    match self.host.rsplit_once(':') {
      Some((host, port)) => {
        let port = port
          .parse()
          .map_err(|_| Error::Config(format!("invalid port in host {:?}", self.host)))?;
        Ok((host, Some(port)))
      }
      None => Ok((self.host.as_str(), None)),
    }
  }

  /// Driver settings built from the discrete fields, so credentials never
  /// need URL escaping. Equivalent to parsing
  /// [`connection_url`](Self::connection_url).
  pub fn pg_config(&self) -> Result<Config> {
    for (field, value) in [("user", &self.user), ("host", &self.host), ("name", &self.name)] {
      if value.trim().is_empty() {
        return Err(Error::Config(format!("database {field} is not set")));
      }
    }

    let (host, port) = self.host_and_port()?;
    let mut config = Config::new();
    config
      .host(host)
      .user(&self.user)
      .password(&self.password)
      .dbname(&self.name)
      .ssl_mode(SslMode::Require)
      .channel_binding(ChannelBinding::Require);
    if let Some(port) = port {
      config.port(port);
    }
    Ok(config)
  }
}

/// TLS connector verifying the server against the Mozilla root set.
///
/// The ring provider is named explicitly so the choice does not depend on
/// which rustls features other crates in the build enable.
pub fn tls_connector() -> Result<MakeRustlsConnect> {
  let mut roots = RootCertStore::empty();
  roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

  let tls = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::Config(format!("TLS setup failed: {e}")))?
    .with_root_certificates(roots)
    .with_no_client_auth();
  Ok(MakeRustlsConnect::new(tls))
}

impl fmt::Debug for PostgresConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PostgresConfig")
      .field("user", &self.user)
      .field("password", &"****")
      .field("host", &self.host)
      .field("name", &self.name)
      .field("max_connections", &self.max_connections)
      .finish()
  }
}
