use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Value")]
    pub value: String,
}

impl Dimension {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One CloudWatch statistics request: a single metric, a single statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricQuery {
    pub namespace: String,
    pub metric_name: String,
    pub unit: String,
    pub statistic: String,
    pub dimensions: Vec<Dimension>,
    pub period: i32,
}

impl MetricQuery {
    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|d| d.name.as_str())
    }
}

impl fmt::Display for MetricQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}[{}] {}/{} @{}s",
            self.namespace,
            self.metric_name,
            self.dimensions
                .iter()
                .map(|d| format!("{}={}", d.name, d.value))
                .join(","),
            self.statistic,
            self.unit,
            self.period
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datapoint {
    pub timestamp: OffsetDateTime,
    pub value: f64,
}

impl Datapoint {
    pub fn new(timestamp: OffsetDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl TimeWindow {
    pub fn ending_at(end: OffsetDateTime, lookback: Duration) -> Self {
        Self {
            start: end - lookback,
            end,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start.format(&Rfc3339).map_err(|_| fmt::Error)?;
        let end = self.end.format(&Rfc3339).map_err(|_| fmt::Error)?;
        write!(f, "{start}..{end}")
    }
}
