//! Chart-ready assembly of aggregated series.

use serde::Serialize;

use crate::series::{AggregatedPoint, ChartType, SeriesDefinition};

/// One series, ready for a charting layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSeries {
  pub key:        String,
  pub label:      String,
  pub color:      String,
  pub chart_type: ChartType,
  pub points:     Vec<AggregatedPoint>,
}

impl AggregatedSeries {
  pub fn new(
    definition: &SeriesDefinition,
    points: Vec<AggregatedPoint>,
  ) -> Self {
    Self {
      key: definition.key.clone(),
      label: definition.label.clone(),
      color: definition.color.clone(),
      chart_type: definition.chart_type,
      points,
    }
  }

  /// True when no point carries a value.
  pub fn is_empty(&self) -> bool { self.points.iter().all(|p| p.value == 0) }
}

/// Pair definitions with their points, in the given order, dropping series
/// that are zero everywhere.
pub fn export<'a, I>(aggregated: I) -> Vec<AggregatedSeries>
where
  I: IntoIterator<Item = (&'a SeriesDefinition, Vec<AggregatedPoint>)>,
{
  aggregated
    .into_iter()
    .map(|(definition, points)| AggregatedSeries::new(definition, points))
    .filter(|series| {
      if series.is_empty() {
        tracing::debug!(series = %series.key, "omitting all-zero series");
      }
      !series.is_empty()
    })
    .collect()
}
