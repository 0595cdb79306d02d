//! Handler for `GET /analytics/series`.

use axum::{Json, extract::State};
use bazaar_timeline::series::{ChartType, SeriesDefinition};
use serde::Serialize;

use crate::ApiState;

/// The public face of a [`SeriesDefinition`]; matchers stay server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInfo {
  pub key:        String,
  pub label:      String,
  pub color:      String,
  pub chart_type: ChartType,
}

impl From<&SeriesDefinition> for SeriesInfo {
  fn from(def: &SeriesDefinition) -> Self {
    Self {
      key:        def.key.clone(),
      label:      def.label.clone(),
      color:      def.color.clone(),
      chart_type: def.chart_type,
    }
  }
}

/// `GET /analytics/series`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Json<Vec<SeriesInfo>> {
  Json(state.catalog.iter().map(SeriesInfo::from).collect())
}
