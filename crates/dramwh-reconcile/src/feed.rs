//! Sources of country reference data for `region_dim`.
//!
//! The published feed is a CSV with a header row naming the columns `Code`,
//! `Name`, `Native`, `Phone`, `Continent`, `Capital`, `Currency` and
//! `Languages`. Only `Code` is mandatory; missing columns and empty cells
//! read as absent.

use std::{future::Future, path::PathBuf, time::Duration};

use dramwh_core::region::CountryRow;
use reqwest::Client;
use tracing::debug;

use crate::{Error, Result};

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can produce the full list of feed rows.
pub trait RegionFeed: Send + Sync {
  /// Where the rows come from, for logs and errors.
  fn origin(&self) -> &str;

  fn fetch(&self) -> impl Future<Output = Result<Vec<CountryRow>>> + Send + '_;
}

/// Parse a CSV document into feed rows.
pub fn parse_csv(origin: &str, data: &[u8]) -> Result<Vec<CountryRow>> {
  let mut reader = csv::Reader::from_reader(data);

  let headers = reader.headers().map_err(|e| Error::fetch(origin, e))?;
  if !headers.iter().any(|h| h.trim() == "Code") {
    return Err(Error::fetch(origin, "no `Code` column in header row"));
  }

  reader
    .deserialize::<CountryRow>()
    .collect::<std::result::Result<Vec<_>, _>>()
    .map_err(|e| Error::fetch(origin, e))
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// The feed published over HTTP(S).
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpRegionFeed {
  client: Client,
  url:    String,
}

impl HttpRegionFeed {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
    Ok(Self {
      client,
      url: url.into(),
    })
  }
}

impl RegionFeed for HttpRegionFeed {
  fn origin(&self) -> &str { &self.url }

  async fn fetch(&self) -> Result<Vec<CountryRow>> {
    let resp = self
      .client
      .get(&self.url)
      .send()
      .await
      .map_err(|e| Error::fetch(&self.url, e))?;

    if !resp.status().is_success() {
      return Err(Error::fetch(&self.url, format!("GET → {}", resp.status())));
    }

    let body = resp.bytes().await.map_err(|e| Error::fetch(&self.url, e))?;
    debug!(url = %self.url, bytes = body.len(), "region feed downloaded");
    parse_csv(&self.url, &body)
  }
}

// ─── File ────────────────────────────────────────────────────────────────────

/// A local copy of the feed.
#[derive(Debug, Clone)]
pub struct FileRegionFeed {
  path:   PathBuf,
  origin: String,
}

impl FileRegionFeed {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let origin = path.display().to_string();
    Self { path, origin }
  }
}

impl RegionFeed for FileRegionFeed {
  fn origin(&self) -> &str { &self.origin }

  async fn fetch(&self) -> Result<Vec<CountryRow>> {
    let data = tokio::fs::read(&self.path)
      .await
      .map_err(|e| Error::fetch(&self.origin, e))?;
    parse_csv(&self.origin, &data)
  }
}

// ─── Static ──────────────────────────────────────────────────────────────────

/// Rows held in memory. Used by tests and by callers that already have the
/// data.
#[derive(Debug, Clone, Default)]
pub struct StaticRegionFeed {
  rows: Vec<CountryRow>,
}

impl StaticRegionFeed {
  pub fn new(rows: Vec<CountryRow>) -> Self { Self { rows } }
}

impl RegionFeed for StaticRegionFeed {
  fn origin(&self) -> &str { "static" }

  async fn fetch(&self) -> Result<Vec<CountryRow>> { Ok(self.rows.clone()) }
}

// ─── Location ────────────────────────────────────────────────────────────────

/// A feed chosen at runtime from a location string: `http://` and
/// `https://` locations are fetched, anything else is read as a file path.
/// With no location every fetch fails, so a run that never needs regions
/// can go without one.
#[derive(Clone)]
pub enum FeedLocation {
  Http(HttpRegionFeed),
  File(FileRegionFeed),
  Unconfigured,
}

impl FeedLocation {
  pub fn is_configured(&self) -> bool { !matches!(self, Self::Unconfigured) }

  pub fn parse(location: Option<&str>, timeout: Duration) -> Result<Self> {
    let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) else {
      return Ok(Self::Unconfigured);
    };
    if location.starts_with("http://") || location.starts_with("https://") {
      Ok(Self::Http(HttpRegionFeed::new(location, timeout)?))
    } else {
      Ok(Self::File(FileRegionFeed::new(location)))
    }
  }
}

impl RegionFeed for FeedLocation {
  fn origin(&self) -> &str {
    match self {
      Self::Http(feed) => feed.origin(),
      Self::File(feed) => feed.origin(),
      Self::Unconfigured => "unconfigured",
    }
  }

  async fn fetch(&self) -> Result<Vec<CountryRow>> {
    match self {
      Self::Http(feed) => feed.fetch().await,
      Self::File(feed) => feed.fetch().await,
      Self::Unconfigured => Err(Error::Config(
        "no region feed configured; pass --region-feed or set DRAMWH_REGION_FEED".into(),
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
  };

  use super::*;

  /// Answer one request on a loopback port with `status` and `body`,
  /// returning the URL to fetch.
  async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut request = [0_u8; 2048];
      let _ = socket.read(&mut request).await;
      let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      let _ = socket.shutdown().await;
    });
    format!("http://{addr}/countries.csv")
  }

  #[test]
  fn parses_published_columns() {
    let data = b"Code,Name,Native,Phone,Continent,Capital,Currency,Languages\n\
      US,United States,United States,1,North America,Washington D.C.,USD,en\n\
      AQ,Antarctica,,,Antarctica,,,\n";
    let rows = parse_csv("inline", data).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].code.as_deref(), Some("US"));
    assert_eq!(rows[0].continent.as_deref(), Some("North America"));
    assert_eq!(rows[1].native, None);
    assert_eq!(rows[1].languages, None);
  }

  #[test]
  fn missing_optional_columns_read_as_absent() {
    let rows = parse_csv("inline", b"Code,Name\nDE,Germany\n").unwrap();
    assert_eq!(rows[0].name.as_deref(), Some("Germany"));
    assert_eq!(rows[0].capital, None);
  }

  #[test]
  fn header_without_code_is_a_fetch_error() {
    let err = parse_csv("inline", b"<html><body>moved</body></html>\n").unwrap_err();
    assert!(matches!(err, Error::ExternalFetch { .. }));
  }

  #[test]
  fn ragged_rows_are_a_fetch_error() {
    let err = parse_csv("inline", b"Code,Name\nUS,United States,extra\n").unwrap_err();
    assert!(matches!(err, Error::ExternalFetch { ref origin, .. } if origin == "inline"));
  }

  #[test]
  fn location_picks_transport() {
    let parse = |loc| FeedLocation::parse(loc, DEFAULT_TIMEOUT).unwrap();
    assert!(matches!(parse(Some("https://example.com/countries.csv")), FeedLocation::Http(_)));
    assert!(matches!(parse(Some("data/countries.csv")), FeedLocation::File(_)));
    assert!(matches!(parse(Some("  ")), FeedLocation::Unconfigured));
    assert!(matches!(parse(None), FeedLocation::Unconfigured));
  }

  #[tokio::test]
  async fn unconfigured_feed_fails_on_fetch() {
    let err = FeedLocation::Unconfigured.fetch().await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
  }

  #[tokio::test]
  async fn missing_file_is_a_fetch_error() {
    let feed = FileRegionFeed::new("/nonexistent/countries.csv");
    let err = feed.fetch().await.unwrap_err();
    assert!(matches!(err, Error::ExternalFetch { .. }));
  }

  #[tokio::test]
  async fn http_feed_parses_a_csv_body() {
    let url = serve_once("200 OK", "Code,Name,Continent\nUS,United States,North America\nDE,Germany,Europe\n").await;
    let feed = HttpRegionFeed::new(&url, DEFAULT_TIMEOUT).unwrap();

    let rows = feed.fetch().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].code.as_deref(), Some("US"));
    assert_eq!(rows[1].continent.as_deref(), Some("Europe"));
    assert_eq!(feed.origin(), url);
  }

  #[tokio::test]
  async fn http_error_status_is_a_fetch_error() {
    let url = serve_once("404 Not Found", "").await;
    let feed = HttpRegionFeed::new(&url, DEFAULT_TIMEOUT).unwrap();

    let err = feed.fetch().await.unwrap_err();
    assert!(matches!(err, Error::ExternalFetch { ref origin, ref reason }
      if *origin == url && reason.contains("404")));
  }

  #[tokio::test]
  async fn refused_connection_is_a_fetch_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let feed = HttpRegionFeed::new(format!("http://{addr}/countries.csv"), DEFAULT_TIMEOUT).unwrap();
    let err = feed.fetch().await.unwrap_err();
    assert!(matches!(err, Error::ExternalFetch { .. }));
  }

  #[test]
  fn only_a_real_location_counts_as_configured() {
    assert!(!FeedLocation::Unconfigured.is_configured());
    let file = FeedLocation::parse(Some("countries.csv"), DEFAULT_TIMEOUT).unwrap();
    assert!(file.is_configured());
  }
}
