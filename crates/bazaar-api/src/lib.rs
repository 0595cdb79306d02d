//! JSON analytics API for Bazaar.
//!
//! Exposes an axum [`Router`] backed by any [`EventSource`]. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! | Method | Path                  | Description                            |
//! |--------|-----------------------|----------------------------------------|
//! | GET    | `/analytics/timeline` | Aggregated series for one store        |
//! | GET    | `/analytics/series`   | The series catalogue                   |
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", bazaar_api::api_router(source.clone(), 256))
//! ```

pub mod cache;
pub mod error;
pub mod series;
pub mod timeline;


use std::sync::Arc;

use axum::{Router, routing::get};
use bazaar_core::source::EventSource;
use bazaar_timeline::{SeriesDefinition, catalog::default_series};

use cache::TimelineCache;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through the analytics handlers.
pub struct ApiState<S> {
  pub source:  Arc<S>,
  pub catalog: Arc<Vec<SeriesDefinition>>,
  pub cache:   Arc<TimelineCache>,
}

impl<S> ApiState<S> {
  pub fn new(
    source: Arc<S>,
    catalog: Vec<SeriesDefinition>,
    cache_capacity: usize,
  ) -> Self {
    Self {
      source,
      catalog: Arc::new(catalog),
      cache: Arc::new(TimelineCache::new(cache_capacity)),
    }
  }
}

// Derived `Clone` would demand `S: Clone`.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      source:  Arc::clone(&self.source),
      catalog: Arc::clone(&self.catalog),
      cache:   Arc::clone(&self.cache),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the analytics router over `source` with the built-in catalogue.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(source: Arc<S>, cache_capacity: usize) -> Router<()>
where
  S: EventSource + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  router(ApiState::new(source, default_series(), cache_capacity))
}

/// Build the analytics router from prepared state.
pub fn router<S>(state: ApiState<S>) -> Router<()>
where
  S: EventSource + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/analytics/timeline", get(timeline::handler::<S>))
    .route("/analytics/series", get(series::list::<S>))
    .with_state(state)
}
