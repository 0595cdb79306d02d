//! The adaptive time axis shared by every series on the dashboard.
//!
//! A timeline has three regions relative to today:
//!
//! | Region | Span | Points |
//! |--------|------|--------|
//! | historical | before `today - 1 month` | one monthly point per month with activity |
//! | recent | `today - 1 month ..= today` | one daily point per day |
//! | future | `today + 1 ..= horizon end` | `+1d`, `+7d`, `+14d`, month starts, the horizon end |
//!
//! On top of that, event boundaries (and promotion interiors) are injected so
//! that every start and end shows up on the axis. Points are keyed by date;
//! the first insertion of a date wins and later ones are ignored.

use std::collections::{BTreeMap, btree_map::Entry};

use bazaar_core::event::{DomainEvent, EntityType};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{calendar, horizon::Horizon};

/// Length of the fallback timeline, ending today.
pub const FALLBACK_DAYS: u64 = 7;

/// Promotions spanning at most this many days get every interior day on the
/// axis; longer ones get only start, midpoint and end.
pub const DENSE_INTERVAL_DAYS: i64 = 7;

/// Future offsets, in days from today, that always get a point when they fit
/// inside the horizon.
pub const STRATEGIC_OFFSETS: [u64; 3] = [1, 7, 14];

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
  Daily,
  /// Covers the whole calendar month; keyed by the month's first day.
  Monthly,
}

/// One position on the chart's time axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
  /// `YYYY-MM-DD`; unique within a timeline.
  pub date_key:    String,
  pub date:        NaiveDate,
  pub label:       String,
  pub granularity: Granularity,
  pub index:       usize,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

struct Builder {
  today:        NaiveDate,
  recent_start: NaiveDate,
  horizon:      Horizon,
  points:       BTreeMap<NaiveDate, (String, Granularity)>,
}

impl Builder {
  fn new(horizon: Horizon, today: NaiveDate) -> Self {
    Self {
      today,
      recent_start: calendar::sub_months(today, 1),
      horizon,
      points: BTreeMap::new(),
    }
  }

  fn insert(
    &mut self,
    date: NaiveDate,
    label: String,
    granularity: Granularity,
  ) {
    match self.points.entry(date) {
      Entry::Vacant(slot) => {
        slot.insert((label, granularity));
      }
      Entry::Occupied(existing) => {
        tracing::trace!(
          %date,
          kept = %existing.get().0,
          ignored = %label,
          "timeline point already present"
        );
      }
    }
  }

  fn daily(&mut self, date: NaiveDate) {
    let label = calendar::daily_label(date, self.today);
    self.insert(date, label, Granularity::Daily);
  }

  fn monthly(&mut self, date: NaiveDate) {
    let start = calendar::month_start(date);
    let label = calendar::monthly_label(start, self.today);
    self.insert(start, label, Granularity::Monthly);
  }

  fn is_historical(&self, date: NaiveDate) -> bool { date < self.recent_start }

  /// Place an activity date on the axis: its month bucket when historical,
  /// its own day otherwise. Dates outside the horizon are skipped.
  fn activity(&mut self, date: NaiveDate) {
    if date < self.horizon.earliest || date > self.horizon.end {
      return;
    }
    if self.is_historical(date) {
      self.monthly(date);
    } else {
      self.daily(date);
    }
  }

  fn historical_region(&mut self, events: &[DomainEvent]) {
    for event in events {
      for date in std::iter::once(event.start).chain(event.end) {
        if self.is_historical(date) {
          self.monthly(date);
        }
      }
    }
  }

  fn recent_region(&mut self) {
    for date in calendar::days_between(self.recent_start, self.today) {
      self.daily(date);
    }
  }

  fn inject_activity(&mut self, events: &[DomainEvent]) {
    for event in events {
      self.activity(event.start);
      if let Some(end) = event.end {
        self.activity(end);
      }
      if event.entity_type == EntityType::PromotionInterval {
        let end = event.effective_end(self.today);
        for date in interior_dates(event.start, end) {
          self.activity(date);
        }
      }
    }
  }

  fn future_region(&mut self) {
    let end = self.horizon.end;
    if end <= self.today {
      return;
    }

    for offset in STRATEGIC_OFFSETS {
      let date = calendar::add_days(self.today, offset);
      if date <= end {
        self.daily(date);
      }
    }

    let mut month = calendar::add_months(calendar::month_start(self.today), 1);
    while month <= end {
      self.monthly(month);
      month = calendar::add_months(month, 1);
    }

    self.daily(end);
  }

  fn finish(self) -> Vec<TimelinePoint> {
    self
      .points
      .into_iter()
      .enumerate()
      .map(|(index, (date, (label, granularity)))| TimelinePoint {
        date_key: calendar::date_key(date),
        date,
        label,
        granularity,
        index,
      })
      .collect()
  }
}

/// Interior dates to inject for a promotion running `start..=end`.
///
/// Short intervals contribute every day; long ones only start, midpoint and
/// end, which is enough to draw the rise and fall on a line chart.
fn interior_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
  let span = calendar::span_days(start, end);
  if span < 0 {
    return Vec::new();
  }
  if span <= DENSE_INTERVAL_DAYS {
    calendar::days_between(start, end).collect()
  } else {
    let mid = calendar::add_days(start, (span / 2) as u64);
    vec![start, mid, end]
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Build the sorted, deduplicated, reindexed timeline for `events`.
///
/// Without events, or when the horizon is inverted, the result is the
/// fallback: the seven days ending today.
pub fn build_timeline(
  horizon: &Horizon,
  events: &[DomainEvent],
  now: DateTime<Utc>,
) -> Vec<TimelinePoint> {
  let today = calendar::today(now);
  if events.is_empty() || horizon.is_inverted() {
    tracing::debug!(
      earliest = %horizon.earliest,
      end = %horizon.end,
      events = events.len(),
      "using fallback timeline"
    );
    return fallback_timeline(today);
  }

  let mut builder = Builder::new(*horizon, today);
  builder.historical_region(events);
  builder.recent_region();
  builder.inject_activity(events);
  builder.future_region();

  let points = builder.finish();
  tracing::debug!(
    points = points.len(),
    first = ?points.first().map(|p| p.date),
    last = ?points.last().map(|p| p.date),
    "built timeline"
  );
  points
}

/// The seven daily points ending with "Today".
pub fn fallback_timeline(today: NaiveDate) -> Vec<TimelinePoint> {
  let start = calendar::sub_days(today, FALLBACK_DAYS - 1);
  let mut builder = Builder::new(
    Horizon {
      earliest: start,
      end:      today,
    },
    today,
  );
  for date in calendar::days_between(start, today) {
    builder.daily(date);
  }
  builder.finish()
}

/// Whether `date` falls within the bucket `point` stands for.
pub fn bucket_contains(point: &TimelinePoint, date: NaiveDate) -> bool {
  match point.granularity {
    Granularity::Daily => point.date == date,
    Granularity::Monthly => {
      point.date.year() == date.year() && point.date.month() == date.month()
    }
  }
}
