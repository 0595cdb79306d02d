//! Error types for `bazaar-timeline`.
//!
//! The engine itself never fails; these cover lookups callers make around it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown series key: {0:?}")]
  UnknownSeries(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
