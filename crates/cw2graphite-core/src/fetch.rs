use anyhow::Result;
use async_trait::async_trait;
use std::num::NonZeroUsize;
use time::format_description::well_known::Rfc3339;
use time::Duration;
use tracing::debug;

use crate::error::PollError;
use crate::models::{Datapoint, MetricQuery, TimeWindow};

pub const BILLING_PERIOD: i32 = 28_800;
pub const BILLING_LOOKBACK: Duration = Duration::hours(30);
pub const DEFAULT_BILLING_PATTERN: &str = "Billing";

#[async_trait]
pub trait MetricSource: Send + Sync {
    /// `Ok(None)` means the response carried no datapoint collection at all.
    async fn get_metric_statistics(
        &self,
        query: &MetricQuery,
        window: &TimeWindow,
    ) -> Result<Option<Vec<Datapoint>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub overlapping_points: Option<NonZeroUsize>,
    pub billing_pattern: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            overlapping_points: None,
            billing_pattern: DEFAULT_BILLING_PATTERN.into(),
        }
    }
}

pub struct Fetcher<'a> {
    source: &'a dyn MetricSource,
    settings: FetchSettings,
}

impl<'a> Fetcher<'a> {
    pub fn new(source: &'a dyn MetricSource, settings: FetchSettings) -> Self {
        Self { source, settings }
    }

    pub fn is_billing(&self, namespace: &str) -> bool {
        !self.settings.billing_pattern.is_empty()
            && namespace.contains(self.settings.billing_pattern.as_str())
    }

    /// Billing namespaces look back from `window.end`, not from `window.start`.
    pub fn plan(&self, query: &MetricQuery, window: &TimeWindow) -> (MetricQuery, TimeWindow) {
        if self.is_billing(&query.namespace) {
            let mut query = query.clone();
            query.period = BILLING_PERIOD;
            (query, TimeWindow::ending_at(window.end, BILLING_LOOKBACK))
        } else {
            (query.clone(), *window)
        }
    }

    pub async fn fetch(
        &self,
        query: &MetricQuery,
        window: &TimeWindow,
    ) -> Result<Vec<Datapoint>, PollError> {
        let (request, window) = self.plan(query, window);
        debug!(query = %request, window = %window, "requesting statistics");
        let points = self
            .source
            .get_metric_statistics(&request, &window)
            .await
            .map_err(|source| PollError::Fetch {
                query: request.to_string(),
                request: request_json(&request, &window),
                source,
            })?;

        let mut points = match points {
            Some(points) if !points.is_empty() => points,
            _ => {
                return Err(PollError::NoData {
                    query: request.to_string(),
                })
            }
        };
        sort_and_trim(&mut points, self.settings.overlapping_points);
        Ok(points)
    }
}

fn request_json(query: &MetricQuery, window: &TimeWindow) -> String {
    serde_json::json!({
        "query": query,
        "start_time": window.start.format(&Rfc3339).ok(),
        "end_time": window.end.format(&Rfc3339).ok(),
    })
    .to_string()
}

pub fn sort_and_trim(points: &mut Vec<Datapoint>, keep: Option<NonZeroUsize>) {
    points.sort_by_key(|p| p.timestamp);
    if let Some(keep) = keep {
        let keep = keep.get();
        if points.len() > keep {
            points.drain(..points.len() - keep);
        }
    }
}
