//! Response cache for timeline requests.
//!
//! The engine is a pure function of its events and the current day, so a
//! response can be reused for as long as neither changes. Keys are SHA-256
//! hashes over the normalized events, today's date and the requested series.

use std::{
  collections::{HashMap, VecDeque},
  sync::{Arc, Mutex, PoisonError},
};

use bazaar_core::event::DomainEvent;
use bazaar_timeline::AggregatedSeries;
use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Compute the cache key for a timeline request.
///
/// Stable across runs and processes: the same events in the same order, on
/// the same day, for the same series keys always hash identically. Event
/// order is part of the key because drill-down picks the first match.
pub fn fingerprint(
  events: &[DomainEvent],
  today: NaiveDate,
  series_keys: &[&str],
) -> String {
  let mut hasher = Sha256::new();
  hasher.update(today.to_string().as_bytes());
  for key in series_keys {
    hasher.update(b"\x1f");
    hasher.update(key.as_bytes());
  }
  for event in events {
    hasher.update(b"\x1e");
    // `attributes` is a sorted map, so serialization is deterministic.
    match serde_json::to_vec(event) {
      Ok(bytes) => hasher.update(bytes),
      Err(_) => hasher.update(event.id.as_bytes()),
    }
  }
  hex::encode(hasher.finalize())
}

/// A bounded first-in, first-out cache of exported series.
///
/// A capacity of zero disables caching.
pub struct TimelineCache {
  capacity: usize,
  inner:    Mutex<Entries>,
}

#[derive(Default)]
struct Entries {
  map:   HashMap<String, Arc<Vec<AggregatedSeries>>>,
  order: VecDeque<String>,
}

impl TimelineCache {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      inner: Mutex::new(Entries::default()),
    }
  }

  pub fn get(&self, key: &str) -> Option<Arc<Vec<AggregatedSeries>>> {
    let entries = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    entries.map.get(key).cloned()
  }

  pub fn insert(&self, key: String, value: Arc<Vec<AggregatedSeries>>) {
    if self.capacity == 0 {
      return;
    }
    let mut entries =
      self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    if entries.map.insert(key.clone(), value).is_none() {
      entries.order.push_back(key);
    }
    while entries.order.len() > self.capacity {
      if let Some(oldest) = entries.order.pop_front() {
        entries.map.remove(&oldest);
      }
    }
  }

  pub fn len(&self) -> usize {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .map
      .len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
