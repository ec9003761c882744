//! Normalisation of country reference data into [`RegionDim`] rows.
//!
//! Pure functions only; fetching the feed lives in `dramwh-reconcile`.

use serde::{Deserialize, Serialize};

use crate::dimension::RegionDim;

/// Continent name used when the source leaves it blank.
pub const UNKNOWN_CONTINENT: &str = "Unknown";

const CONTINENTS: [(&str, &str); 7] = [
  ("Africa", "AF"),
  ("Antarctica", "AN"),
  ("Asia", "AS"),
  ("Europe", "EU"),
  ("North America", "NA"),
  ("Oceania", "OC"),
  ("South America", "SA"),
];

/// Two-letter continent code for an exact continent name.
pub fn continent_code(name: &str) -> Option<&'static str> {
  CONTINENTS
    .iter()
    .find(|(n, _)| *n == name)
    .map(|(_, code)| *code)
}

/// Trim a free-text value, treating missing, blank and `nan` (any case) as
/// absent.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
  let trimmed = raw?.trim();
  if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
    None
  } else {
    Some(trimmed.to_owned())
  }
}

/// Split a language list on `;` and `,` and re-join it comma-separated.
pub fn normalize_languages(raw: Option<&str>) -> Option<String> {
  let raw = clean_text(raw)?;
  let parts: Vec<&str> = raw
    .split([';', ','])
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect();
  if parts.is_empty() { None } else { Some(parts.join(",")) }
}

/// One row of the external country feed, as published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRow {
  #[serde(rename = "Code")]
  pub code:      Option<String>,
  #[serde(rename = "Name")]
  pub name:      Option<String>,
  #[serde(rename = "Native")]
  pub native:    Option<String>,
  #[serde(rename = "Phone")]
  pub phone:     Option<String>,
  #[serde(rename = "Continent")]
  pub continent: Option<String>,
  #[serde(rename = "Capital")]
  pub capital:   Option<String>,
  #[serde(rename = "Currency")]
  pub currency:  Option<String>,
  #[serde(rename = "Languages")]
  pub languages: Option<String>,
}

impl CountryRow {
  /// The cleaned country code, if the row has a usable one.
  pub fn country_code(&self) -> Option<String> { clean_text(self.code.as_deref()) }
}

impl RegionDim {
  /// Build a new (unsaved) region row from a feed row.
  ///
  /// Returns `None` when the row has no usable country code.
  pub fn from_country(row: &CountryRow) -> Option<Self> {
    let country_code = row.country_code()?;
    let (continent_name, continent_code) = match clean_text(row.continent.as_deref()) {
      Some(name) => {
        let code = continent_code(&name).map(str::to_owned);
        (name, code)
      }
      None => (UNKNOWN_CONTINENT.to_owned(), None),
    };

    Some(Self {
      region_id: None,
      country_code,
      country_name: clean_text(row.name.as_deref()),
      native_name: clean_text(row.native.as_deref()),
      phone_code: clean_text(row.phone.as_deref()),
      continent_code,
      continent_name,
      capital: clean_text(row.capital.as_deref()),
      currency: clean_text(row.currency.as_deref()),
      languages: normalize_languages(row.languages.as_deref()),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn nan_placeholders_are_absent() {
    assert_eq!(clean_text(Some("nan")), None);
    assert_eq!(clean_text(Some("  NaN ")), None);
    assert_eq!(clean_text(Some("")), None);
    assert_eq!(clean_text(None), None);
    assert_eq!(clean_text(Some(" Nanjing ")), Some("Nanjing".into()));
  }

  #[test]
  fn languages_accept_both_separators() {
    assert_eq!(
      normalize_languages(Some("en; fr,de ;;")),
      Some("en,fr,de".into())
    );
    assert_eq!(normalize_languages(Some(" ; , ")), None);
    assert_eq!(normalize_languages(Some("nan")), None);
  }

  #[test]
  fn continent_table_has_seven_entries() {
    assert_eq!(continent_code("North America"), Some("NA"));
    assert_eq!(continent_code("Antarctica"), Some("AN"));
    assert_eq!(continent_code("Atlantis"), None);
  }

  #[test]
  fn blank_continent_becomes_unknown_without_code() {
    let row = CountryRow {
      code: Some("ZZ".into()),
      continent: Some("nan".into()),
      ..CountryRow::default()
    };
    let region = RegionDim::from_country(&row).unwrap();
    assert_eq!(region.continent_name, UNKNOWN_CONTINENT);
    assert_eq!(region.continent_code, None);
  }

  #[test]
  fn unrecognised_continent_keeps_its_name() {
    let row = CountryRow {
      code: Some("ZZ".into()),
      continent: Some("Atlantis".into()),
      ..CountryRow::default()
    };
    let region = RegionDim::from_country(&row).unwrap();
    assert_eq!(region.continent_name, "Atlantis");
    assert_eq!(region.continent_code, None);
  }

  #[test]
  fn full_row_is_normalised() {
    let row = CountryRow {
      code:      Some(" NA ".into()),
      name:      Some("Namibia".into()),
      native:    Some("Namibia".into()),
      phone:     Some("264".into()),
      continent: Some("Africa".into()),
      capital:   Some("Windhoek".into()),
      currency:  Some("NAD,ZAR".into()),
      languages: Some("en;af".into()),
    };
    let region = RegionDim::from_country(&row).unwrap();
    assert_eq!(region.region_id, None);
    assert_eq!(region.country_code, "NA");
    assert_eq!(region.continent_code.as_deref(), Some("AF"));
    assert_eq!(region.languages.as_deref(), Some("en,af"));
    assert_eq!(region.phone_code.as_deref(), Some("264"));
  }

  #[test]
  fn missing_code_is_rejected() {
    let row = CountryRow { code: Some("nan".into()), ..CountryRow::default() };
    assert!(RegionDim::from_country(&row).is_none());
  }
}
