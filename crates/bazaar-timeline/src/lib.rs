//! Analytics timeline engine for Bazaar retailer dashboards.
//!
//! Merges products, promotion intervals and view samples into one adaptive
//! time axis and computes a value per point for each requested series. Pure
//! synchronous; no HTTP or database dependencies. "Now" is always a
//! parameter, never read from the clock.
//!
//! The pipeline runs in five steps, each usable on its own:
//!
//! 1. [`normalize`] — raw JSON records to [`DomainEvent`]s.
//! 2. [`Horizon::compute`] — the `[earliest, end]` window.
//! 3. [`build_timeline`] — the deduplicated, sorted axis.
//! 4. [`aggregate`] — one series' values along the axis.
//! 5. [`export`] — assembly, dropping all-zero series.
//!
//! # Quick start
//!
//! ```no_run
//! use bazaar_timeline::{build_analytics_timeline, catalog::default_series};
//! use chrono::Utc;
//! use serde_json::json;
//!
//! let products = vec![json!({ "id": "p1", "createdAt": "2026-10-01" })];
//! let series =
//!   build_analytics_timeline(&products, &[], &[], &default_series(), Utc::now());
//! println!("{} series with data", series.len());
//! ```

pub mod calendar;
pub mod catalog;
pub mod error;
pub mod export;
pub mod horizon;
pub mod normalize;
pub mod series;
pub mod timeline;

use chrono::{DateTime, Utc};
use serde_json::Value;

pub use bazaar_core::event::DomainEvent;
pub use error::{Error, Result};
pub use export::{AggregatedSeries, export};
pub use horizon::Horizon;
pub use normalize::normalize;
pub use series::{AggregatedPoint, SeriesDefinition, aggregate};
pub use timeline::{TimelinePoint, build_timeline};

/// Run the whole pipeline over raw records.
///
/// Always returns a renderable result: malformed records are dropped, an
/// empty or inverted window degrades to the seven-day fallback axis, and
/// series without data are omitted.
pub fn build_analytics_timeline(
  products: &[Value],
  promotions: &[Value],
  view_samples: &[Value],
  series_defs: &[SeriesDefinition],
  now: DateTime<Utc>,
) -> Vec<AggregatedSeries> {
  let events = normalize(products, promotions, view_samples, now);
  analyze(&events, series_defs, now)
}

/// Steps 2 to 5 over already-normalized events.
pub fn analyze(
  events: &[DomainEvent],
  series_defs: &[SeriesDefinition],
  now: DateTime<Utc>,
) -> Vec<AggregatedSeries> {
  let horizon = Horizon::compute(events, now);
  let timeline = build_timeline(&horizon, events, now);
  export(
    series_defs
      .iter()
      .map(|def| (def, aggregate(&timeline, events, def, now))),
  )
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone};
  use serde_json::json;

  use super::*;
  use crate::catalog::default_series;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 45, 0).unwrap()
  }

  fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  fn sample_inputs() -> (Vec<Value>, Vec<Value>, Vec<Value>) {
    let products = vec![
      json!({ "id": "p-old", "createdAt": "2026-09-09T10:00:00Z", "title": "Tote bag" }),
      json!({ "id": "p-new", "createdAt": "2026-10-12T16:20:00Z", "title": "Scarf" }),
      json!({ "id": "p-bad", "createdAt": "yesterday-ish" }),
    ];
    let promotions = vec![
      json!({
        "id": "bogo-1",
        "title": "Autumn two for one",
        "dealType": "BOGO",
        "startsAt": "2026-10-19T00:00:00Z",
        "endsAt": "2026-10-29T23:59:00Z",
      }),
      json!({
        "id": "pct-1",
        "dealType": "percentage",
        "startsAt": "2026-06-01",
        "endsAt": "2026-06-20",
      }),
    ];
    let views = vec![
      json!({ "date": "2026-10-17", "count": 40 }),
      json!({ "2026-10-18": 12, "2026-10-19": 3 }),
    ];
    (products, promotions, views)
  }

  #[test]
  fn zero_events_omit_every_series() {
    let out = build_analytics_timeline(&[], &[], &[], &default_series(), now());
    assert!(out.is_empty());
  }

  #[test]
  fn zero_events_timeline_is_seven_days() {
    let events = normalize(&[], &[], &[], now());
    let timeline = build_timeline(&Horizon::compute(&events, now()), &events, now());
    assert_eq!(timeline.len(), 7);
    assert_eq!(timeline.last().unwrap().label, "Today");
  }

  #[test]
  fn full_pipeline_properties() {
    let (products, promotions, views) = sample_inputs();
    let defs = default_series();
    let out = build_analytics_timeline(&products, &promotions, &views, &defs, now());

    let keys: Vec<_> = out.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["products", "views", "bogo", "percentage"]);

    // The BOGO promotion ends within a month, so it caps the horizon.
    let horizon_end = d("2026-10-29");
    for series in &out {
      assert!(series.points.iter().any(|p| p.value > 0));
      assert!(series.points.iter().all(|p| p.date <= horizon_end));
      for pair in series.points.windows(2) {
        assert!(pair[0].date < pair[1].date);
      }
    }

    let bogo = out.iter().find(|s| s.key == "bogo").unwrap();
    let today = bogo.points.iter().find(|p| p.date == d("2026-10-19")).unwrap();
    assert_eq!(today.value, 1);
    assert_eq!(today.label, "Today");
    assert_eq!(today.point_label, "Autumn two for one");

    let views = out.iter().find(|s| s.key == "views").unwrap();
    let oct17 = views.points.iter().find(|p| p.date == d("2026-10-17")).unwrap();
    assert_eq!(oct17.value, 40);

    let pct = out.iter().find(|s| s.key == "percentage").unwrap();
    let june = pct.points.iter().find(|p| p.date == d("2026-06-01")).unwrap();
    assert_eq!(june.value, 1);
    assert_eq!(june.label, "Jun");
  }

  #[test]
  fn output_is_byte_identical_across_runs() {
    let (products, promotions, views) = sample_inputs();
    let defs = default_series();
    let a = build_analytics_timeline(&products, &promotions, &views, &defs, now());
    let b = build_analytics_timeline(&products, &promotions, &views, &defs, now());
    assert_eq!(
      serde_json::to_vec(&a).unwrap(),
      serde_json::to_vec(&b).unwrap()
    );
  }

  #[test]
  fn points_align_across_series() {
    let (products, promotions, views) = sample_inputs();
    let out =
      build_analytics_timeline(&products, &promotions, &views, &default_series(), now());
    let dates: Vec<_> = out[0].points.iter().map(|p| p.date).collect();
    for series in &out[1..] {
      let other: Vec<_> = series.points.iter().map(|p| p.date).collect();
      assert_eq!(dates, other);
    }
  }
}
