//! The analysis window a timeline must cover.

use bazaar_core::event::{DomainEvent, EntityType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar;

/// Days looked back when there are no events at all.
pub const FALLBACK_LOOKBACK_DAYS: u64 = 7;

/// The `[earliest, end]` window, in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Horizon {
  pub earliest: NaiveDate,
  /// Never before today, never after today plus one calendar month.
  pub end:      NaiveDate,
}

impl Horizon {
  /// Compute the window for `events` as seen at `now`.
  ///
  /// - `earliest` is the earliest event start, or a week before today when
  ///   there are no events.
  /// - `end` is the furthest promotion end falling in `(today, today + 1
  ///   month]`; without one it is `today + 1 month`. Promotions that already
  ///   ended, or end beyond the cap, never pull it.
  pub fn compute(events: &[DomainEvent], now: DateTime<Utc>) -> Self {
    let today = calendar::today(now);
    let one_month_out = calendar::add_months(today, 1);

    let earliest = events
      .iter()
      .map(|e| e.start)
      .min()
      .unwrap_or_else(|| calendar::sub_days(today, FALLBACK_LOOKBACK_DAYS));

    let furthest_promotion_end = events
      .iter()
      .filter(|e| e.entity_type == EntityType::PromotionInterval)
      .filter_map(|e| e.end)
      .filter(|end| today < *end && *end <= one_month_out)
      .max();

    Self {
      earliest,
      end: furthest_promotion_end.unwrap_or(one_month_out),
    }
  }

  /// Whether the window is empty (`earliest` after `end`).
  pub fn is_inverted(&self) -> bool { self.earliest > self.end }
}
