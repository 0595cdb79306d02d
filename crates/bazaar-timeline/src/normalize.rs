//! Event normalization: untyped source records in, [`DomainEvent`]s out.
//!
//! Normalization never fails. Records that cannot be turned into an event
//! (not an object, missing identifier or date, unparsable timestamp, an
//! interval ending before it starts) are dropped and logged at `debug`.

use bazaar_core::{
  event::{DomainEvent, EntityType},
  source::SourceRecords,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::calendar;

// ─── Field names ─────────────────────────────────────────────────────────────

const ID: &[&str] = &["id", "_id"];
const CREATED_AT: &[&str] = &["createdAt", "created_at"];
const STARTS_AT: &[&str] = &["startsAt", "starts_at", "startDate"];
const ENDS_AT: &[&str] = &["endsAt", "ends_at", "endDate"];
const DEAL_TYPE: &[&str] = &["dealType", "deal_type"];
const SAMPLE_DATE: &[&str] = &["date", "day"];
const ENTITY_TYPE: &[&str] = &["entityType", "entity_type"];

/// The canonical attribute key for a promotion's deal type.
pub const DEAL_TYPE_KEY: &str = "dealType";
/// The attribute key carrying a view sample's count.
pub const COUNT_KEY: &str = "count";

// ─── Public API ──────────────────────────────────────────────────────────────

/// Normalize the three raw collections into one event list.
///
/// Output order is products, then promotions, then view samples, each in
/// input order. View samples dated after `now`'s day are dropped: a view
/// count cannot have been observed yet.
pub fn normalize(
  products: &[Value],
  promotions: &[Value],
  view_samples: &[Value],
  now: DateTime<Utc>,
) -> Vec<DomainEvent> {
  let today = calendar::today(now);
  let mut events = Vec::with_capacity(
    products.len() + promotions.len() + view_samples.len(),
  );

  events.extend(products.iter().filter_map(product_event));
  events.extend(promotions.iter().filter_map(promotion_event));
  for record in view_samples {
    events.extend(view_events(record, today));
  }

  tracing::debug!(
    input = products.len() + promotions.len() + view_samples.len(),
    output = events.len(),
    "normalized source records"
  );
  events
}

/// [`normalize`] over a fetched [`SourceRecords`] bundle.
pub fn normalize_records(
  records: &SourceRecords,
  now: DateTime<Utc>,
) -> Vec<DomainEvent> {
  normalize(
    &records.products,
    &records.promotions,
    &records.view_samples,
    now,
  )
}

/// Normalize a single mixed list in which every record names its own
/// `entityType`. Records with a missing or unknown type are ignored.
pub fn normalize_tagged(
  records: &[Value],
  now: DateTime<Utc>,
) -> Vec<DomainEvent> {
  let mut sorted = SourceRecords::default();
  for record in records {
    let Some(tag) = field(record, ENTITY_TYPE).and_then(Value::as_str) else {
      tracing::debug!("dropping record without entityType");
      continue;
    };
    match tag.parse::<EntityType>() {
      Ok(EntityType::Product) => sorted.products.push(record.clone()),
      Ok(EntityType::PromotionInterval) => {
        sorted.promotions.push(record.clone())
      }
      Ok(EntityType::ViewSample) => sorted.view_samples.push(record.clone()),
      Err(e) => tracing::debug!("ignoring record: {e}"),
    }
  }
  normalize_records(&sorted, now)
}

/// Parse a raw timestamp into its UTC calendar date.
///
/// Accepts RFC 3339 strings, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` (also with
/// a `T` separator, read as UTC) and integer epoch milliseconds.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
  match value {
    Value::String(s) => parse_date_str(s.trim()),
    Value::Number(n) => n
      .as_i64()
      .and_then(DateTime::from_timestamp_millis)
      .map(|dt| dt.date_naive()),
    _ => None,
  }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc).date_naive());
  }
  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Some(date);
  }
  ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|dt| dt.date())
}

// ─── Per-kind conversion ─────────────────────────────────────────────────────

/// Outcome of looking up a date field.
enum DateField {
  Missing,
  Malformed,
  Present(NaiveDate),
}

fn date_field(record: &Value, names: &[&str]) -> DateField {
  match field(record, names) {
    None => DateField::Missing,
    Some(raw) => match parse_date(raw) {
      Some(date) => DateField::Present(date),
      None => DateField::Malformed,
    },
  }
}

fn product_event(record: &Value) -> Option<DomainEvent> {
  let attributes = record.as_object()?;
  let id = id_of(record)?;
  let DateField::Present(created) = date_field(record, CREATED_AT) else {
    tracing::debug!(%id, "dropping product without a valid createdAt");
    return None;
  };
  build(EntityType::Product, id, created, None, attributes.clone())
}

fn promotion_event(record: &Value) -> Option<DomainEvent> {
  let raw = record.as_object()?;
  let id = id_of(record)?;
  let DateField::Present(start) = date_field(record, STARTS_AT) else {
    tracing::debug!(%id, "dropping promotion without a valid startsAt");
    return None;
  };
  let end = match date_field(record, ENDS_AT) {
    DateField::Missing => None,
    DateField::Present(end) => Some(end),
    DateField::Malformed => {
      tracing::debug!(%id, "dropping promotion with a malformed endsAt");
      return None;
    }
  };

  let mut attributes = raw.clone();
  if !attributes.contains_key(DEAL_TYPE_KEY)
    && let Some(deal) = field(record, DEAL_TYPE)
  {
    attributes.insert(DEAL_TYPE_KEY.to_owned(), deal.clone());
  }
  build(EntityType::PromotionInterval, id, start, end, attributes)
}

/// A view sample is either `{"date": ..., "count": ...}` or a map of
/// `date -> count` pairs; each pair becomes one event.
fn view_events(record: &Value, today: NaiveDate) -> Vec<DomainEvent> {
  let Some(object) = record.as_object() else {
    return Vec::new();
  };

  // Only the single-sample shape can carry its own id.
  let mut explicit_id = None;
  let pairs: Vec<(NaiveDate, Map<String, Value>)> =
    if field(record, SAMPLE_DATE).is_some() {
      explicit_id = field(record, ID).and_then(id_string);
      match date_field(record, SAMPLE_DATE) {
        DateField::Present(date) => vec![(date, object.clone())],
        _ => {
          tracing::debug!("dropping view sample with a malformed date");
          Vec::new()
        }
      }
    } else {
      object
        .iter()
        .filter_map(|(key, count)| {
          let Some(date) = parse_date_str(key) else {
            tracing::debug!(%key, "dropping view sample with a malformed date");
            return None;
          };
          let mut attributes = Map::new();
          attributes.insert("date".to_owned(), Value::String(key.clone()));
          attributes.insert(COUNT_KEY.to_owned(), count.clone());
          Some((date, attributes))
        })
        .collect()
    };

  pairs
    .into_iter()
    .filter(|(date, _)| {
      let observed = *date <= today;
      if !observed {
        tracing::debug!(%date, "dropping future-dated view sample");
      }
      observed
    })
    .filter_map(|(date, attributes)| {
      let id = explicit_id
        .clone()
        .unwrap_or_else(|| format!("views:{}", calendar::date_key(date)));
      build(EntityType::ViewSample, id, date, Some(date), attributes)
    })
    .collect()
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The first present, non-null field among `names`.
fn field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
  names
    .iter()
    .filter_map(|name| record.get(name))
    .find(|v| !v.is_null())
}

fn id_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn id_of(record: &Value) -> Option<String> {
  let id = field(record, ID).and_then(id_string);
  if id.is_none() {
    tracing::debug!("dropping record without an id");
  }
  id
}

fn build(
  entity_type: EntityType,
  id: String,
  start: NaiveDate,
  end: Option<NaiveDate>,
  attributes: Map<String, Value>,
) -> Option<DomainEvent> {
  DomainEvent::new(entity_type, id, start, end, attributes)
    .inspect_err(|e| tracing::warn!("dropping {entity_type} record: {e}"))
    .ok()
}
