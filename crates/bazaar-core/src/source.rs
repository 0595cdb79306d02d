//! The `EventSource` trait and the raw record bundle it yields.
//!
//! The analytics engine never fetches anything itself. Backends (e.g.
//! `bazaar-store-sqlite`) implement this trait; the HTTP layer calls it once
//! per request and hands the result to the pure engine.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

// ─── Raw records ─────────────────────────────────────────────────────────────

/// Untyped source records for one store, in the order they were recorded.
///
/// Each entry is expected to be a JSON object; anything else is dropped
/// during normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecords {
  #[serde(default)]
  pub products:     Vec<Value>,
  #[serde(default)]
  pub promotions:   Vec<Value>,
  #[serde(default)]
  pub view_samples: Vec<Value>,
}

impl SourceRecords {
  /// Parse a JSON document of the form
  /// `{"products": [...], "promotions": [...], "viewSamples": [...]}`.
  /// Missing keys are treated as empty lists.
  pub fn from_json_str(input: &str) -> Result<Self> {
    Ok(serde_json::from_str(input)?)
  }

  pub fn is_empty(&self) -> bool {
    self.products.is_empty()
      && self.promotions.is_empty()
      && self.view_samples.is_empty()
  }

  pub fn len(&self) -> usize {
    self.products.len() + self.promotions.len() + self.view_samples.len()
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over wherever a store's raw analytics records live.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EventSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch every raw product, promotion and view-sample record for
  /// `store_id`. An unknown store yields empty lists, not an error.
  fn fetch_records<'a>(
    &'a self,
    store_id: &'a str,
  ) -> impl Future<Output = Result<SourceRecords, Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_json_str_defaults_missing_lists() {
    let records =
      SourceRecords::from_json_str(r#"{"products":[{"id":"a"}]}"#).unwrap();
    assert_eq!(records.products.len(), 1);
    assert!(records.promotions.is_empty());
    assert!(records.view_samples.is_empty());
    assert_eq!(records.len(), 1);
  }

  #[test]
  fn from_json_str_rejects_garbage() {
    assert!(SourceRecords::from_json_str("[1, 2").is_err());
  }
}
