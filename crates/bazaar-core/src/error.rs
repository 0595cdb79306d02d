//! Error types for `bazaar-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event {id} ends ({end}) before it starts ({start})")]
  InvertedInterval {
    id:    String,
    start: NaiveDate,
    end:   NaiveDate,
  },

  #[error("unknown entity type: {0:?}")]
  UnknownEntityType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
