use crate::error::PollError;
use crate::models::{Dimension, MetricQuery};

pub const DEFAULT_PERIOD: i32 = 60;
pub const MAX_DIMENSIONS: usize = 10;

/// Builds a query descriptor for a single metric and statistic.
///
/// `period` falls back to [`DEFAULT_PERIOD`] seconds.
pub fn build_query(
    namespace: &str,
    metric_name: &str,
    unit: &str,
    statistic: &str,
    dimensions: Vec<Dimension>,
    period: Option<i32>,
) -> Result<MetricQuery, PollError> {
    if namespace.is_empty() {
        return Err(PollError::InvalidQuery(format!(
            "empty namespace for metric {metric_name:?}"
        )));
    }
    if metric_name.is_empty() {
        return Err(PollError::InvalidQuery(format!(
            "empty metric name in namespace {namespace}"
        )));
    }
    if dimensions.len() > MAX_DIMENSIONS {
        return Err(PollError::InvalidQuery(format!(
            "{namespace}:{metric_name} has {} dimensions, at most {MAX_DIMENSIONS} allowed",
            dimensions.len()
        )));
    }
    if let Some(dim) = dimensions
        .iter()
        .find(|d| d.name.is_empty() || d.value.is_empty())
    {
        return Err(PollError::InvalidQuery(format!(
            "{namespace}:{metric_name} has an incomplete dimension {:?}={:?}",
            dim.name, dim.value
        )));
    }
    let period = period.unwrap_or(DEFAULT_PERIOD);
    if period <= 0 {
        return Err(PollError::InvalidQuery(format!(
            "{namespace}:{metric_name} has non-positive period {period}"
        )));
    }

    Ok(MetricQuery {
        namespace: namespace.to_string(),
        metric_name: metric_name.to_string(),
        unit: unit.to_string(),
        statistic: statistic.to_string(),
        dimensions,
        period,
    })
}
