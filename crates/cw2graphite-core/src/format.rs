use anyhow::Result;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{Datapoint, MetricQuery};
use crate::timeutils::epoch_seconds;

pub const REGION_PLACEHOLDER: &str = "{region}";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `aws.elb.loadbalancername_my-elb.latency`
    #[default]
    Current,
    /// `cloudwatch.aws.elb.my-elb.latency.average.seconds`
    Legacy,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "current" | "new" => Ok(OutputFormat::Current),
            "legacy" | "old" => Ok(OutputFormat::Legacy),
            _ => anyhow::bail!("unknown output format: {s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    format: OutputFormat,
    prefix: Option<String>,
    lowercase: bool,
}

impl Formatter {
    pub fn current() -> Self {
        Self {
            format: OutputFormat::Current,
            prefix: None,
            lowercase: false,
        }
    }

    /// Lowercases current-format paths. Legacy paths are always lowercase.
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        if self.format == OutputFormat::Current {
            self.lowercase = lowercase;
        }
        self
    }

    /// `prefix` may contain [`REGION_PLACEHOLDER`]; an empty prefix adds no segment.
    pub fn legacy(prefix: Option<&str>, region: Option<&str>) -> Self {
        let prefix = prefix.filter(|p| !p.is_empty()).map(|p| match region {
            Some(region) => p.replace(REGION_PLACEHOLDER, region),
            None => p.to_string(),
        });
        Self {
            format: OutputFormat::Legacy,
            prefix,
            lowercase: true,
        }
    }

    pub fn new(format: OutputFormat, prefix: Option<&str>, region: Option<&str>) -> Self {
        match format {
            OutputFormat::Current => Self::current(),
            OutputFormat::Legacy => Self::legacy(prefix, region),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    pub fn metric_path(&self, query: &MetricQuery) -> String {
        match self.format {
            OutputFormat::Current if self.lowercase => current_path(query).to_lowercase(),
            OutputFormat::Current => current_path(query),
            OutputFormat::Legacy => legacy_path(query, self.prefix.as_deref()),
        }
    }

    pub fn format(&self, query: &MetricQuery, points: &[Datapoint]) -> Vec<String> {
        let path = self.metric_path(query);
        points
            .iter()
            .map(|p| format!("{path} {} {}", p.value, epoch_seconds(p.timestamp)))
            .collect()
    }
}

fn namespace_segment(namespace: &str) -> String {
    namespace.replace('/', ".")
}

fn current_path(query: &MetricQuery) -> String {
    std::iter::once(namespace_segment(&query.namespace))
        .chain(
            query
                .dimensions
                .iter()
                .map(|d| format!("{}_{}", d.name, d.value)),
        )
        .chain(std::iter::once(query.metric_name.clone()))
        .join(".")
}

fn legacy_path(query: &MetricQuery, prefix: Option<&str>) -> String {
    prefix
        .map(str::to_string)
        .into_iter()
        .chain(std::iter::once(namespace_segment(&query.namespace)))
        .chain(query.dimensions.iter().map(|d| d.value.clone()))
        .chain([
            query.metric_name.clone(),
            query.statistic.clone(),
            query.unit.clone(),
        ])
        .filter(|segment| !segment.is_empty())
        .join(".")
        .to_lowercase()
}
