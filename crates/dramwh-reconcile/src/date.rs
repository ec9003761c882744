//! Gapless extension of `date_dim`.

use chrono::NaiveDate;
use dramwh_core::{
  calendar::{days_inclusive, years_after, EPOCH},
  dimension::DateDim,
  store::WarehouseStore,
};
use tracing::info;

use crate::{Error, Result};

/// Largest accepted `years_ahead`.
pub const MAX_YEARS_AHEAD: u32 = 100;

pub(crate) fn check_years_ahead(years_ahead: u32) -> Result<()> {
  if years_ahead > MAX_YEARS_AHEAD {
    return Err(Error::Config(format!(
      "years_ahead is {years_ahead}; at most {MAX_YEARS_AHEAD} is supported"
    )));
  }
  Ok(())
}

/// What one date reconciliation wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFill {
  pub inserted: usize,
  /// First and last date written; `None` when the table was already
  /// complete.
  pub range:    Option<(NaiveDate, NaiveDate)>,
}

/// Extend `date_dim` so it covers every day from its current end (or
/// [`EPOCH`] when empty) through `today` plus `years_ahead` years.
///
/// Only missing dates are written, in one all-or-nothing batch. Running it
/// twice on the same day writes nothing the second time. `years_ahead`
/// above [`MAX_YEARS_AHEAD`] is rejected before the store is read.
pub async fn ensure_date_dim<S: WarehouseStore>(
  store: &S,
  today: NaiveDate,
  years_ahead: u32,
) -> Result<DateFill> {
  check_years_ahead(years_ahead)?;
  let end = years_after(today, years_ahead);

  let start = match store.max_value::<DateDim>("date").await.map_err(Error::store)? {
    None => Some(EPOCH),
    Some(last) => {
      let last = last.as_date().ok_or(Error::UnexpectedValue {
        table:    "date_dim",
        column:   "date",
        expected: "date",
        found:    last.kind(),
      })?;
      last.succ_opt()
    }
  };

  let Some(start) = start.filter(|start| *start <= end) else {
    info!(%end, "date_dim already complete");
    return Ok(DateFill::default());
  };

  let rows: Vec<DateDim> = days_inclusive(start, end).map(DateDim::for_date).collect();
  let inserted = store.add_all(rows).await.map_err(Error::store)?;

  info!(inserted, %start, %end, "date_dim extended");
  Ok(DateFill {
    inserted,
    range: Some((start, end)),
  })
}
