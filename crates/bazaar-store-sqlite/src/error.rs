//! Error type for `bazaar-store-sqlite`.

use bazaar_core::event::EntityType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] bazaar_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// Source records must be JSON objects.
  #[error("{0} record is not a JSON object")]
  NotAnObject(EntityType),

  #[error("store id must not be empty")]
  EmptyStoreId,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
