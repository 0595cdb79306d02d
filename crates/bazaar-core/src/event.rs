//! Domain events — the canonical input of the analytics engine.
//!
//! Every raw source record (a product, a promotion, a daily view count) is
//! reduced to a [`DomainEvent`]: an entity type, an identifier, a calendar
//! date range and the untouched raw payload. Dates carry no time component;
//! all bucketing downstream works on whole days.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── Entity type ─────────────────────────────────────────────────────────────

/// Which kind of source record an event was derived from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
  /// A product listing; a point-in-time event at its creation date.
  Product,
  /// A promotion's active interval; open-ended when `end` is absent.
  PromotionInterval,
  /// One day's view count; `start == end`.
  ViewSample,
}

impl EntityType {
  /// The tag used in tagged raw records and in the SQLite `kind` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Product => "product",
      Self::PromotionInterval => "promotion",
      Self::ViewSample => "view_sample",
    }
  }
}

impl fmt::Display for EntityType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for EntityType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "product" => Ok(Self::Product),
      "promotion" | "promotion_interval" => Ok(Self::PromotionInterval),
      "view_sample" | "views" => Ok(Self::ViewSample),
      other => Err(Error::UnknownEntityType(other.to_owned())),
    }
  }
}

// ─── DomainEvent ─────────────────────────────────────────────────────────────

/// A single normalized occurrence with a calendar-date extent.
///
/// Invariant: `end`, if present, is never before `start`. Use
/// [`DomainEvent::new`] to have it checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
  pub entity_type: EntityType,
  pub id:          String,
  pub start:       NaiveDate,
  pub end:         Option<NaiveDate>,
  /// The raw source record, kept verbatim for matching and drill-down.
  pub attributes:  Map<String, Value>,
}

impl DomainEvent {
  /// Build an event, rejecting intervals that end before they start.
  pub fn new(
    entity_type: EntityType,
    id: impl Into<String>,
    start: NaiveDate,
    end: Option<NaiveDate>,
    attributes: Map<String, Value>,
  ) -> Result<Self> {
    let id = id.into();
    if let Some(end) = end
      && end < start
    {
      return Err(Error::InvertedInterval { id, start, end });
    }
    Ok(Self {
      entity_type,
      id,
      start,
      end,
      attributes,
    })
  }

  /// The last day this event covers, or `None` for open-ended promotions.
  ///
  /// Point-in-time events (products, view samples without an explicit end)
  /// cover exactly their start date.
  pub fn last_day(&self) -> Option<NaiveDate> {
    match (self.entity_type, self.end) {
      (_, Some(end)) => Some(end),
      (EntityType::PromotionInterval, None) => None,
      (_, None) => Some(self.start),
    }
  }

  /// The last day this event covers, with open-ended promotions capped at
  /// `today`. An open-ended promotion starting after `today` covers nothing.
  pub fn effective_end(&self, today: NaiveDate) -> NaiveDate {
    self.last_day().unwrap_or(today)
  }

  /// Whether the event's active interval contains `date`.
  pub fn active_on(&self, date: NaiveDate, today: NaiveDate) -> bool {
    self.start <= date && date <= self.effective_end(today)
  }

  /// Whether the event is active on any day in `from..=to`.
  pub fn overlaps(
    &self,
    from: NaiveDate,
    to: NaiveDate,
    today: NaiveDate,
  ) -> bool {
    self.start <= to && self.effective_end(today) >= from
  }

  /// A string attribute, if present.
  pub fn attribute_str(&self, key: &str) -> Option<&str> {
    self.attributes.get(key).and_then(Value::as_str)
  }

  /// A non-negative integer attribute. Numeric strings are accepted;
  /// negative or fractional values yield `None`.
  pub fn attribute_u64(&self, key: &str) -> Option<u64> {
    match self.attributes.get(key)? {
      Value::Number(n) => n.as_u64(),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }

  /// A human-readable title: `title`, then `name`, then the id.
  pub fn title(&self) -> &str {
    self
      .attribute_str("title")
      .or_else(|| self.attribute_str("name"))
      .unwrap_or(&self.id)
  }
}
