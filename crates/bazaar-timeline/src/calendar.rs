//! Calendar arithmetic and chart labels.
//!
//! Month arithmetic clamps to the last valid day (Jan 31 + 1 month is
//! Feb 28/29), matching `chrono::Months`.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

/// The calendar day of `now`, in UTC.
pub fn today(now: DateTime<Utc>) -> NaiveDate { now.date_naive() }

pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
  date
    .checked_add_months(Months::new(months))
    .unwrap_or(NaiveDate::MAX)
}

pub fn sub_months(date: NaiveDate, months: u32) -> NaiveDate {
  date
    .checked_sub_months(Months::new(months))
    .unwrap_or(NaiveDate::MIN)
}

pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
  date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

pub fn sub_days(date: NaiveDate, days: u64) -> NaiveDate {
  date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// First day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

/// Last day of `date`'s month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
  month_start(date)
    .checked_add_months(Months::new(1))
    .and_then(|next| next.pred_opt())
    .unwrap_or(date)
}

/// Every day in `from..=to`; empty when `from > to`.
pub fn days_between(
  from: NaiveDate,
  to: NaiveDate,
) -> impl Iterator<Item = NaiveDate> {
  from.iter_days().take_while(move |d| *d <= to)
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn span_days(from: NaiveDate, to: NaiveDate) -> i64 {
  (to - from).num_days()
}

/// The `YYYY-MM-DD` key of a timeline point.
pub fn date_key(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

/// `"Today"`, or the short month and day (`"Mar 5"`).
pub fn daily_label(date: NaiveDate, today: NaiveDate) -> String {
  if date == today {
    "Today".to_owned()
  } else {
    date.format("%b %-d").to_string()
  }
}

/// The short month name, with the year appended outside the current year.
pub fn monthly_label(date: NaiveDate, today: NaiveDate) -> String {
  if date.year() == today.year() {
    date.format("%b").to_string()
  } else {
    date.format("%b %Y").to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  #[test]
  fn month_bounds() {
    assert_eq!(month_start(d("2026-02-17")), d("2026-02-01"));
    assert_eq!(month_end(d("2026-02-17")), d("2026-02-28"));
    assert_eq!(month_end(d("2028-02-03")), d("2028-02-29"));
    assert_eq!(month_end(d("2026-12-31")), d("2026-12-31"));
  }

  #[test]
  fn month_arithmetic_clamps() {
    assert_eq!(add_months(d("2026-01-31"), 1), d("2026-02-28"));
    assert_eq!(sub_months(d("2026-03-31"), 1), d("2026-02-28"));
  }

  #[test]
  fn labels() {
    let today = d("2026-10-19");
    assert_eq!(daily_label(today, today), "Today");
    assert_eq!(daily_label(d("2026-10-05"), today), "Oct 5");
    assert_eq!(monthly_label(d("2026-03-01"), today), "Mar");
    assert_eq!(monthly_label(d("2025-12-01"), today), "Dec 2025");
  }

  #[test]
  fn days_between_is_inclusive() {
    let days: Vec<_> = days_between(d("2026-01-30"), d("2026-02-02")).collect();
    assert_eq!(days.len(), 4);
    assert_eq!(days_between(d("2026-02-02"), d("2026-01-30")).count(), 0);
  }
}
