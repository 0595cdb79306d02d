//! SQLite backend for Bazaar analytics source records.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Records are stored as untyped JSON;
//! interpreting them is the timeline engine's job.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteEventStore;
