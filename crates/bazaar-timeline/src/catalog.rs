//! The built-in series shown on the retailer analytics dashboard.

use bazaar_core::event::EntityType;

use crate::{
  Error, Result,
  normalize::{COUNT_KEY, DEAL_TYPE_KEY},
  series::{ChartType, EventMatcher, Metric, SeriesDefinition},
};

/// Promotion deal types with a dedicated series: `(key, dealType, label,
/// color)`.
pub const DEAL_TYPES: &[(&str, &str, &str, &str)] = &[
  ("bogo", "BOGO", "Buy One Get One", "#e4572e"),
  ("percentage", "PERCENTAGE", "Percentage Off", "#f3a712"),
  ("fixed_amount", "FIXED_AMOUNT", "Fixed Amount Off", "#a8c686"),
  ("bundle", "BUNDLE", "Bundle Deals", "#669bbc"),
];

/// Products created, views, then one series per deal type.
pub fn default_series() -> Vec<SeriesDefinition> {
  let mut series = vec![
    SeriesDefinition {
      key:        "products".to_owned(),
      label:      "Products Created".to_owned(),
      color:      "#17bebb".to_owned(),
      chart_type: ChartType::Bar,
      matcher:    EventMatcher::entity(EntityType::Product),
      metric:     Metric::Count,
    },
    SeriesDefinition {
      key:        "views".to_owned(),
      label:      "Views".to_owned(),
      color:      "#2e86ab".to_owned(),
      chart_type: ChartType::Line,
      matcher:    EventMatcher::entity(EntityType::ViewSample),
      metric:     Metric::Sum {
        attribute: COUNT_KEY.to_owned(),
      },
    },
  ];

  series.extend(DEAL_TYPES.iter().map(|(key, deal, label, color)| {
    SeriesDefinition {
      key:        (*key).to_owned(),
      label:      (*label).to_owned(),
      color:      (*color).to_owned(),
      chart_type: ChartType::Line,
      matcher:    EventMatcher::entity(EntityType::PromotionInterval)
        .with_attribute(DEAL_TYPE_KEY, *deal),
      metric:     Metric::Count,
    }
  }));
  series
}

/// Look up `keys` in `catalog`, preserving the requested order.
pub fn select<'a>(
  catalog: &[SeriesDefinition],
  keys: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<SeriesDefinition>> {
  keys
    .into_iter()
    .map(|key| {
      catalog
        .iter()
        .find(|def| def.key == key)
        .cloned()
        .ok_or_else(|| Error::UnknownSeries(key.to_owned()))
    })
    .collect()
}
