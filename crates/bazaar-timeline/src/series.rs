//! Series definitions and per-point aggregation over a shared timeline.
//!
//! Daily points are exact samples: the metric over events active on that
//! day. Monthly points sample the last day of the month and, if that is
//! zero, fall back to the busiest day of the month. A promotion that ended
//! mid-month therefore still shows up in its month instead of reading as a
//! false zero. Monthly and daily points are deliberately not computed the
//! same way.

use std::collections::BTreeMap;

use bazaar_core::event::{DomainEvent, EntityType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{
  calendar,
  timeline::{Granularity, TimelinePoint},
};

/// Longest drill-down label, in characters, before truncation.
pub const POINT_LABEL_MAX_CHARS: usize = 24;

// ─── Definitions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
  Line,
  Bar,
}

/// How matching events are turned into a number.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metric {
  /// Number of matching active events.
  #[default]
  Count,
  /// Sum of a non-negative integer attribute over matching active events.
  /// Events lacking the attribute contribute zero.
  Sum { attribute: String },
}

/// Decides which events contribute to a series.
///
/// Matches when the entity type agrees (if set) and every listed attribute
/// equals the event's. String attributes compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMatcher {
  pub entity_type: Option<EntityType>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub attributes:  BTreeMap<String, Value>,
}

impl EventMatcher {
  pub fn entity(entity_type: EntityType) -> Self {
    Self {
      entity_type: Some(entity_type),
      attributes:  BTreeMap::new(),
    }
  }

  pub fn with_attribute(
    mut self,
    key: impl Into<String>,
    value: impl Into<Value>,
  ) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }

  pub fn matches(&self, event: &DomainEvent) -> bool {
    if self.entity_type.is_some_and(|t| t != event.entity_type) {
      return false;
    }
    self.attributes.iter().all(|(key, expected)| {
      match (event.attributes.get(key), expected) {
        (Some(Value::String(a)), Value::String(b)) => a.eq_ignore_ascii_case(b),
        (Some(actual), expected) => actual == expected,
        (None, _) => false,
      }
    })
  }
}

/// One metric track plotted across the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDefinition {
  pub key:        String,
  pub label:      String,
  pub color:      String,
  pub chart_type: ChartType,
  pub matcher:    EventMatcher,
  #[serde(default)]
  pub metric:     Metric,
}

impl SeriesDefinition {
  fn weight(&self, event: &DomainEvent) -> u64 {
    match &self.metric {
      Metric::Count => 1,
      Metric::Sum { attribute } => event.attribute_u64(attribute).unwrap_or(0),
    }
  }
}

// ─── Aggregated output ───────────────────────────────────────────────────────

/// A series' value at one timeline point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
  pub value:       u64,
  /// The timeline point's label.
  pub label:       String,
  pub date:        NaiveDate,
  /// Short text derived from `drill_down`; empty when `value` is zero.
  pub point_label: String,
  /// The first matching event in the bucket, in input order; `None` when
  /// `value` is zero.
  #[serde(rename = "drillDownId", serialize_with = "serialize_drill_down_id")]
  pub drill_down:  Option<DomainEvent>,
}

fn serialize_drill_down_id<S: Serializer>(
  event: &Option<DomainEvent>,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  match event {
    Some(e) => serializer.serialize_some(&e.id),
    None => serializer.serialize_none(),
  }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

struct Aggregator<'a> {
  definition: &'a SeriesDefinition,
  matching:   Vec<&'a DomainEvent>,
  today:      NaiveDate,
}

impl Aggregator<'_> {
  fn value_on(&self, date: NaiveDate) -> u64 {
    self
      .matching
      .iter()
      .filter(|e| e.active_on(date, self.today))
      .map(|e| self.definition.weight(e))
      .sum()
  }

  fn daily(&self, date: NaiveDate) -> (u64, Option<&DomainEvent>) {
    let value = self.value_on(date);
    let drill_down = self
      .matching
      .iter()
      .find(|e| e.active_on(date, self.today))
      .copied();
    (value, drill_down)
  }

  fn monthly(&self, date: NaiveDate) -> (u64, Option<&DomainEvent>) {
    let first = calendar::month_start(date);
    let last = calendar::month_end(date);

    let mut value = self.value_on(last);
    if value == 0 {
      value = calendar::days_between(first, last)
        .map(|day| self.value_on(day))
        .max()
        .unwrap_or(0);
    }
    let drill_down = self
      .matching
      .iter()
      .find(|e| e.overlaps(first, last, self.today))
      .copied();
    (value, drill_down)
  }

  fn point(&self, point: &TimelinePoint) -> AggregatedPoint {
    let (value, drill_down) = match point.granularity {
      Granularity::Daily => self.daily(point.date),
      Granularity::Monthly => self.monthly(point.date),
    };
    let drill_down = drill_down.filter(|_| value > 0);

    AggregatedPoint {
      value,
      label: point.label.clone(),
      date: point.date,
      point_label: drill_down
        .map(|e| truncate(e.title(), POINT_LABEL_MAX_CHARS))
        .unwrap_or_default(),
      drill_down: drill_down.cloned(),
    }
  }
}

/// Compute `definition` at every point of `timeline`.
///
/// The result is aligned 1:1 with `timeline` and depends only on the
/// arguments.
pub fn aggregate(
  timeline: &[TimelinePoint],
  events: &[DomainEvent],
  definition: &SeriesDefinition,
  now: DateTime<Utc>,
) -> Vec<AggregatedPoint> {
  let aggregator = Aggregator {
    definition,
    matching: events
      .iter()
      .filter(|e| definition.matcher.matches(e))
      .collect(),
    today: calendar::today(now),
  };
  tracing::trace!(
    series = %definition.key,
    matching = aggregator.matching.len(),
    "aggregating series"
  );
  timeline.iter().map(|p| aggregator.point(p)).collect()
}

/// Shorten `text` to at most `max` characters, marking the cut with `…`.
fn truncate(text: &str, max: usize) -> String {
  if text.chars().count() <= max {
    return text.to_owned();
  }
  let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
  short.push('…');
  short
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::{Map, json};

  use super::*;
  use crate::horizon::Horizon;
  use crate::timeline::build_timeline;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
  }

  fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  fn event(
    kind: EntityType,
    id: &str,
    start: &str,
    end: Option<&str>,
    attrs: Value,
  ) -> DomainEvent {
    DomainEvent::new(
      kind,
      id,
      d(start),
      end.map(d),
      attrs.as_object().cloned().unwrap_or_else(Map::new),
    )
    .unwrap()
  }

  fn bogo() -> SeriesDefinition {
    SeriesDefinition {
      key:        "bogo".into(),
      label:      "BOGO".into(),
      color:      "#e4572e".into(),
      chart_type: ChartType::Line,
      matcher:    EventMatcher::entity(EntityType::PromotionInterval)
        .with_attribute("dealType", "BOGO"),
      metric:     Metric::Count,
    }
  }

  fn products() -> SeriesDefinition {
    SeriesDefinition {
      key:        "products".into(),
      label:      "Products Created".into(),
      color:      "#17bebb".into(),
      chart_type: ChartType::Bar,
      matcher:    EventMatcher::entity(EntityType::Product),
      metric:     Metric::Count,
    }
  }

  fn run(
    events: &[DomainEvent],
    def: &SeriesDefinition,
  ) -> Vec<AggregatedPoint> {
    let timeline =
      build_timeline(&Horizon::compute(events, now()), events, now());
    aggregate(&timeline, events, def, now())
  }

  fn at<'a>(points: &'a [AggregatedPoint], date: &str) -> &'a AggregatedPoint {
    points
      .iter()
      .find(|p| p.date == d(date))
      .unwrap_or_else(|| panic!("no point at {date}"))
  }

  #[test]
  fn matcher_checks_entity_and_attributes() {
    let promo = event(
      EntityType::PromotionInterval,
      "a",
      "2026-10-01",
      None,
      json!({ "dealType": "bogo" }),
    );
    assert!(bogo().matcher.matches(&promo));
    assert!(!products().matcher.matches(&promo));
    assert!(
      !EventMatcher::entity(EntityType::PromotionInterval)
        .with_attribute("dealType", "bundle")
        .matches(&promo)
    );
  }

  #[test]
  fn ten_day_bogo_is_active_at_start_mid_and_end() {
    let events = [event(
      EntityType::PromotionInterval,
      "bogo-1",
      "2026-10-19",
      Some("2026-10-29"),
      json!({ "dealType": "BOGO", "title": "Two for one" }),
    )];
    let points = run(&events, &bogo());

    for date in ["2026-10-19", "2026-10-24", "2026-10-29"] {
      let p = at(&points, date);
      assert_eq!(p.value, 1, "value at {date}");
      assert_eq!(p.point_label, "Two for one");
      assert_eq!(p.drill_down.as_ref().map(|e| e.id.as_str()), Some("bogo-1"));
    }
    let before = at(&points, "2026-10-18");
    assert_eq!(before.value, 0);
    assert!(before.drill_down.is_none());
    assert!(before.point_label.is_empty());
  }

  #[test]
  fn old_product_counts_in_its_month() {
    let events = [event(
      EntityType::Product,
      "mug",
      "2026-09-09",
      None,
      json!({ "title": "Ceramic mug" }),
    )];
    let points = run(&events, &products());
    let month = at(&points, "2026-09-01");
    assert_eq!(month.value, 1);
    assert_eq!(month.point_label, "Ceramic mug");
  }

  #[test]
  fn monthly_prefers_month_end_value() {
    let events = [
      event(
        EntityType::PromotionInterval,
        "early",
        "2026-03-02",
        Some("2026-03-04"),
        json!({ "dealType": "BOGO" }),
      ),
      event(
        EntityType::PromotionInterval,
        "late",
        "2026-03-20",
        Some("2026-04-10"),
        json!({ "dealType": "BOGO" }),
      ),
    ];
    let points = run(&events, &bogo());
    // Only "late" is active on Mar 31.
    assert_eq!(at(&points, "2026-03-01").value, 1);
    assert_eq!(
      at(&points, "2026-03-01").drill_down.as_ref().unwrap().id,
      "early"
    );
  }

  #[test]
  fn monthly_falls_back_to_busiest_day() {
    let events = [
      event(
        EntityType::PromotionInterval,
        "a",
        "2026-02-03",
        Some("2026-02-10"),
        json!({ "dealType": "BOGO" }),
      ),
      event(
        EntityType::PromotionInterval,
        "b",
        "2026-02-08",
        Some("2026-02-12"),
        json!({ "dealType": "BOGO" }),
      ),
    ];
    let points = run(&events, &bogo());
    // Zero on Feb 28; both overlap on Feb 8-10.
    assert_eq!(at(&points, "2026-02-01").value, 2);
  }

  #[test]
  fn sum_metric_adds_attribute() {
    let views = SeriesDefinition {
      key:        "views".into(),
      label:      "Views".into(),
      color:      "#2e86ab".into(),
      chart_type: ChartType::Line,
      matcher:    EventMatcher::entity(EntityType::ViewSample),
      metric:     Metric::Sum {
        attribute: "count".into(),
      },
    };
    let events = [
      event(
        EntityType::ViewSample,
        "v1",
        "2026-10-10",
        Some("2026-10-10"),
        json!({ "count": 5 }),
      ),
      event(
        EntityType::ViewSample,
        "v2",
        "2026-10-10",
        Some("2026-10-10"),
        json!({ "count": 7 }),
      ),
      event(
        EntityType::ViewSample,
        "v3",
        "2026-10-11",
        Some("2026-10-11"),
        json!({ "count": "oops" }),
      ),
    ];
    let points = run(&events, &views);
    assert_eq!(at(&points, "2026-10-10").value, 12);
    assert_eq!(at(&points, "2026-10-11").value, 0);
    assert!(at(&points, "2026-10-11").drill_down.is_none());
  }

  #[test]
  fn open_promotion_stops_at_today() {
    let events = [event(
      EntityType::PromotionInterval,
      "open",
      "2026-10-15",
      None,
      json!({ "dealType": "BOGO" }),
    )];
    let points = run(&events, &bogo());
    assert_eq!(at(&points, "2026-10-19").value, 1);
    assert_eq!(at(&points, "2026-10-20").value, 0);
  }

  #[test]
  fn aggregation_is_aligned_and_deterministic() {
    let events = [
      event(EntityType::Product, "a", "2026-01-05", None, json!({})),
      event(EntityType::Product, "b", "2026-10-05", None, json!({})),
    ];
    let timeline =
      build_timeline(&Horizon::compute(&events, now()), &events, now());
    let first = aggregate(&timeline, &events, &products(), now());
    let second = aggregate(&timeline, &events, &products(), now());

    assert_eq!(first.len(), timeline.len());
    assert_eq!(first, second);
    assert_eq!(
      serde_json::to_string(&first).unwrap(),
      serde_json::to_string(&second).unwrap()
    );
  }

  #[test]
  fn point_serializes_drill_down_as_id() {
    let events = [event(
      EntityType::Product,
      "sku-9",
      "2026-10-05",
      None,
      json!({}),
    )];
    let points = run(&events, &products());
    let json = serde_json::to_value(at(&points, "2026-10-05")).unwrap();
    assert_eq!(json["drillDownId"], "sku-9");
    assert_eq!(json["pointLabel"], "sku-9");
    assert_eq!(json["date"], "2026-10-05");
    assert!(json.get("drillDown").is_none());
  }

  #[test]
  fn truncate_marks_cut() {
    assert_eq!(truncate("short", 24), "short");
    let long = "An extremely long promotion title";
    let cut = truncate(long, 10);
    assert_eq!(cut.chars().count(), 10);
    assert!(cut.ends_with('…'));
  }
}
