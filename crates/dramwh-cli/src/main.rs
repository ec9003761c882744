//! `dramwh`: bootstrap the DRAM market warehouse.
//!
//! Creates any missing tables, extends `date_dim` through next year and, on
//! a reset or when asked, loads new countries into `region_dim`.
//!
//! # Usage
//!
//! ```
//! dramwh                                   # Postgres from DB_* variables
//! dramwh --sqlite warehouse.db --region-feed countries.csv --force-reset
//! dramwh --refresh-regions --echo
//! ```
//!
//! Postgres credentials come from `DB_USER`, `DB_PASSWORD`, `DB_HOST` and
//! `DB_NAME` (optionally `DB_MAX_CONNECTIONS`), read from the environment or
//! a `config.env` file in the working directory. The same keys without the
//! prefix may also sit in the settings file.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use dramwh_core::store::{SchemaReset, WarehouseStore};
use dramwh_reconcile::{
  feed::{FeedLocation, DEFAULT_TIMEOUT},
  Bootstrap, DimensionReport, DEFAULT_YEARS_AHEAD, MAX_YEARS_AHEAD,
};
use dramwh_store_postgres::{PgWarehouse, PostgresConfig};
use dramwh_store_sqlite::SqliteWarehouse;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Initialise the DRAM market warehouse")]
struct Cli {
  /// Path to a TOML settings file (region_feed, feed_timeout_secs,
  /// years_ahead, and the Postgres user, password, host and name).
  #[arg(short, long, default_value = "dramwh.toml")]
  config: PathBuf,

  /// Use an embedded SQLite database at PATH instead of Postgres.
  #[arg(long, value_name = "PATH", env = "DRAMWH_SQLITE")]
  sqlite: Option<PathBuf>,

  /// Drop and recreate every table before reconciling. All data is lost.
  #[arg(long)]
  force_reset: bool,

  /// Load new countries from the region feed without a reset.
  #[arg(long)]
  refresh_regions: bool,

  /// Years of future dates to keep in date_dim (0 to 100).
  #[arg(long, value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_YEARS_AHEAD)))]
  years_ahead: Option<u32>,

  /// URL or file path of the country CSV feed.
  #[arg(long, value_name = "URL|PATH")]
  region_feed: Option<String>,

  /// Log every SQL statement.
  #[arg(long)]
  echo: bool,
}

// ─── Settings ────────────────────────────────────────────────────────────────

/// Bootstrap settings from the TOML file and `DRAMWH_*` variables. Flags
/// take precedence.
#[derive(Debug, Default, Deserialize)]
struct Settings {
  #[serde(default)]
  region_feed:       Option<String>,
  #[serde(default)]
  feed_timeout_secs: Option<u64>,
  #[serde(default)]
  years_ahead:       Option<u32>,
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
  config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("DRAMWH"))
    .build()
    .with_context(|| format!("failed to read settings from {}", path.display()))?
    .try_deserialize()
    .context("failed to deserialise settings")
}

/// Connection fields from the settings file, overridden by `DB_*`.
fn load_postgres_config(path: &Path) -> anyhow::Result<PostgresConfig> {
  config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("DB"))
    .build()
    .context("failed to read DB_* variables")?
    .try_deserialize()
    .context("DB_USER, DB_PASSWORD, DB_HOST and DB_NAME must all be set")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // `config.env` is optional; real environment variables win.
  dotenvy::from_filename("config.env").ok();

  let cli = Cli::parse();

  let mut filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();
  if cli.echo {
    filter = filter.add_directive("dramwh::sql=debug".parse()?);
  }
  tracing_subscriber::fmt().with_env_filter(filter).init();

  let settings = load_settings(&cli.config)?;

  let timeout = settings
    .feed_timeout_secs
    .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
  let location = cli.region_feed.as_deref().or(settings.region_feed.as_deref());
  let feed = FeedLocation::parse(location, timeout).context("invalid region feed")?;
  check_feed_required(&cli, &feed)?;

  let reset = if cli.force_reset {
    SchemaReset::DropAndRecreate
  } else {
    SchemaReset::Keep
  };
  let years_ahead = cli.years_ahead.or(settings.years_ahead).unwrap_or(DEFAULT_YEARS_AHEAD);
  anyhow::ensure!(
    years_ahead <= MAX_YEARS_AHEAD,
    "years_ahead is {years_ahead}; at most {MAX_YEARS_AHEAD} is supported"
  );
  let plan = Plan {
    years_ahead,
    reset,
    refresh_regions: cli.refresh_regions,
  };

  let report = match &cli.sqlite {
    Some(path) => {
      let path = expand_tilde(path);
      let store = SqliteWarehouse::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      plan.run(store, feed).await?
    }
    None => {
      let pg = load_postgres_config(&cli.config)?;
      let store = PgWarehouse::connect(&pg)
        .await
        .with_context(|| format!("failed to connect to {}", pg.redacted_url()))?;
      plan.run(store, feed).await?
    }
  };

  print_report(&report);
  Ok(())
}

/// Runs that load regions need a feed; refuse them before any store is
/// opened.
fn check_feed_required(cli: &Cli, feed: &FeedLocation) -> anyhow::Result<()> {
  if (cli.force_reset || cli.refresh_regions) && !feed.is_configured() {
    anyhow::bail!(
      "--force-reset and --refresh-regions load region_dim; pass --region-feed or set \
       DRAMWH_REGION_FEED"
    );
  }
  Ok(())
}

/// What one invocation asks the bootstrap to do.
struct Plan {
  years_ahead:     u32,
  reset:           SchemaReset,
  refresh_regions: bool,
}

impl Plan {
  async fn run<S: WarehouseStore>(
    &self,
    store: S,
    feed: FeedLocation,
  ) -> anyhow::Result<DimensionReport> {
    Bootstrap::new(store, feed)
      .years_ahead(self.years_ahead)
      .run(self.reset, self.refresh_regions)
      .await
      .context("bootstrap failed")
  }
}

fn print_report(report: &DimensionReport) {
  if let Some(fill) = report.date {
    match fill.range {
      Some((start, end)) => println!("date_dim:   {} days added ({start} to {end})", fill.inserted),
      None => println!("date_dim:   up to date"),
    }
  }
  if let Some(sync) = report.region {
    println!(
      "region_dim: {} inserted, {} skipped, {} failed",
      sync.inserted, sync.skipped, sync.failed
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reset_is_opt_in() {
    let cli = Cli::try_parse_from(["dramwh"]).unwrap();
    assert!(!cli.force_reset);
    assert!(!cli.refresh_regions);
    assert_eq!(cli.config, PathBuf::from("dramwh.toml"));

    let cli = Cli::try_parse_from(["dramwh", "--force-reset", "--years-ahead", "3"]).unwrap();
    assert!(cli.force_reset);
    assert_eq!(cli.years_ahead, Some(3));
  }

  #[test]
  fn years_ahead_is_bounded() {
    let cli = Cli::try_parse_from(["dramwh", "--years-ahead", "100"]).unwrap();
    assert_eq!(cli.years_ahead, Some(100));

    assert!(Cli::try_parse_from(["dramwh", "--years-ahead", "101"]).is_err());
    assert!(Cli::try_parse_from(["dramwh", "--years-ahead", "4294967295"]).is_err());
  }

  #[test]
  fn region_loading_needs_a_feed() {
    let none = FeedLocation::Unconfigured;
    let file = FeedLocation::parse(Some("countries.csv"), DEFAULT_TIMEOUT).unwrap();

    let reset = Cli::try_parse_from(["dramwh", "--force-reset"]).unwrap();
    assert!(check_feed_required(&reset, &none).is_err());
    assert!(check_feed_required(&reset, &file).is_ok());

    let refresh = Cli::try_parse_from(["dramwh", "--refresh-regions"]).unwrap();
    assert!(check_feed_required(&refresh, &none).is_err());

    let plain = Cli::try_parse_from(["dramwh"]).unwrap();
    assert!(check_feed_required(&plain, &none).is_ok());
  }

  #[test]
  fn missing_settings_file_falls_back_to_defaults() {
    let settings = load_settings(Path::new("/nonexistent/dramwh.toml")).unwrap();
    assert_eq!(settings.years_ahead, None);
    assert_eq!(settings.feed_timeout_secs, None);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/dram.db")), PathBuf::from(home).join("dram.db"));
    assert_eq!(expand_tilde(Path::new("/tmp/dram.db")), PathBuf::from("/tmp/dram.db"));
  }
}
