//! Handler for `GET /analytics/timeline`.
//!
//! `storeId` is required. `seriesKeys` is a comma-separated subset of the
//! catalogue, e.g. `products,bogo`; when absent or empty every series is
//! computed.
//! `asOf` pins "now" to an RFC 3339 instant and defaults to the wall clock.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use bazaar_core::source::EventSource;
use bazaar_timeline::{
  AggregatedSeries, Horizon, aggregate, build_timeline, catalog,
  export, normalize::normalize_records,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{ApiState, cache::fingerprint, error::ApiError};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimelineParams {
  pub store_id:    Option<String>,
  /// Comma-separated series keys, e.g. `views,percentage`.
  pub series_keys: Option<String>,
  /// RFC 3339 instant, e.g. `2026-10-19T08:00:00Z`.
  pub as_of:       Option<String>,
}

/// `GET /analytics/timeline?storeId=...[&seriesKeys=...][&asOf=...]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<TimelineParams>,
) -> Result<Json<Vec<AggregatedSeries>>, ApiError>
where
  S: EventSource + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let store_id = params
    .store_id
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
    .ok_or_else(|| ApiError::BadRequest("storeId is required".to_owned()))?;

  let requested: Vec<&str> = params
    .series_keys
    .as_deref()
    .map(|s| s.split(',').map(str::trim).filter(|k| !k.is_empty()).collect())
    .unwrap_or_default();
  let definitions = if requested.is_empty() {
    state.catalog.as_ref().clone()
  } else {
    catalog::select(&state.catalog, requested)
      .map_err(|e| ApiError::BadRequest(e.to_string()))?
  };

  let now = match params.as_of.as_deref().map(str::trim) {
    None | Some("") => Utc::now(),
    Some(raw) => DateTime::parse_from_rfc3339(raw)
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(|e| ApiError::BadRequest(format!("invalid asOf {raw:?}: {e}")))?,
  };

  let records = state
    .source
    .fetch_records(&store_id)
    .await
    .map_err(|e| ApiError::Source(Box::new(e)))?;
  let events = normalize_records(&records, now);

  let keys: Vec<&str> = definitions.iter().map(|d| d.key.as_str()).collect();
  let cache_key = fingerprint(&events, now.date_naive(), &keys);
  if let Some(cached) = state.cache.get(&cache_key) {
    tracing::debug!(%store_id, "timeline cache hit");
    return Ok(Json(cached.as_ref().clone()));
  }

  let horizon = Horizon::compute(&events, now);
  let timeline = Arc::new(build_timeline(&horizon, &events, now));
  let events = Arc::new(events);

  // Series are independent; compute them off the async runtime and join in
  // request order so the output order never depends on scheduling.
  let handles: Vec<_> = definitions
    .iter()
    .cloned()
    .map(|def| {
      let timeline = Arc::clone(&timeline);
      let events = Arc::clone(&events);
      tokio::task::spawn_blocking(move || {
        aggregate(&timeline, &events, &def, now)
      })
    })
    .collect();

  let mut aggregated = Vec::with_capacity(handles.len());
  for (def, handle) in definitions.iter().zip(handles) {
    aggregated.push((def, handle.await?));
  }
  let series = export(aggregated);

  tracing::info!(
    %store_id,
    events = events.len(),
    points = timeline.len(),
    requested = definitions.len(),
    returned = series.len(),
    "built analytics timeline"
  );

  state.cache.insert(cache_key, Arc::new(series.clone()));
  Ok(Json(series))
}
