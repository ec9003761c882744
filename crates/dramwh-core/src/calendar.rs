//! Calendar derivations for `date_dim` rows.

use chrono::{Datelike, Months, NaiveDate, Weekday};

use crate::dimension::DateDim;

/// First day covered by `date_dim` when the table is empty.
pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 1) {
  Some(d) => d,
  None => panic!("invalid epoch"),
};

/// Quarter (1–4) of a month (1–12).
pub fn quarter_of(month: u32) -> u32 { (month - 1) / 3 + 1 }

pub fn weekday_name(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
}

/// `today` shifted forward by whole years; Feb 29 lands on Feb 28.
pub fn years_after(today: NaiveDate, years: u32) -> NaiveDate {
  today
    .checked_add_months(Months::new(years.saturating_mul(12)))
    .unwrap_or(NaiveDate::MAX)
}

/// Every date in `[start, end]`; empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
  start.iter_days().take_while(move |d| *d <= end)
}

impl DateDim {
  /// Derive every calendar column from `date`.
  pub fn for_date(date: NaiveDate) -> Self {
    let weekday = date.weekday();
    Self {
      date,
      year: date.year(),
      quarter: quarter_of(date.month()) as i32,
      month: date.month() as i32,
      week: date.iso_week().week() as i32,
      day_of_week_num: weekday.number_from_monday() as i32,
      day_of_week: weekday_name(weekday).to_owned(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  #[test]
  fn derives_friday_in_first_quarter() {
    let row = DateDim::for_date(ymd(2024, 3, 15));
    assert_eq!(row.year, 2024);
    assert_eq!(row.quarter, 1);
    assert_eq!(row.month, 3);
    assert_eq!(row.week, 11);
    assert_eq!(row.day_of_week_num, 5);
    assert_eq!(row.day_of_week, "Friday");
  }

  #[test]
  fn quarters_split_on_three_month_boundaries() {
    let quarters: Vec<u32> = (1..=12).map(quarter_of).collect();
    assert_eq!(quarters, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
  }

  #[test]
  fn iso_week_wraps_at_year_end() {
    // 2021-01-01 is a Friday in ISO week 53 of 2020.
    let row = DateDim::for_date(ymd(2021, 1, 1));
    assert_eq!(row.week, 53);
    assert_eq!(row.year, 2021);

    let sunday = DateDim::for_date(ymd(2024, 3, 17));
    assert_eq!(sunday.day_of_week_num, 7);
    assert_eq!(sunday.day_of_week, "Sunday");
  }

  #[test]
  fn leap_day_clamps() {
    assert_eq!(years_after(ymd(2024, 2, 29), 1), ymd(2025, 2, 28));
    assert_eq!(years_after(ymd(2024, 6, 1), 0), ymd(2024, 6, 1));
  }

  #[test]
  fn inclusive_range() {
    let days: Vec<_> = days_inclusive(ymd(2024, 2, 27), ymd(2024, 3, 1)).collect();
    assert_eq!(days.len(), 4);
    assert_eq!(days[2], ymd(2024, 2, 29));
    assert_eq!(days_inclusive(ymd(2024, 3, 2), ymd(2024, 3, 1)).count(), 0);
  }
}
