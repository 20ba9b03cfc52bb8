use crate::fetch::{FetchSettings, DEFAULT_BILLING_PATTERN};
use crate::format::{Formatter, OutputFormat};
use crate::models::{Dimension, MetricQuery};
use crate::query::build_query;
use crate::resources::ResourceKind;
use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cw2graphite", "cw2graphite")
            .context("cannot locate config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Reads TOML, or JSON when the file has a `.json` extension. A missing
    /// file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(PathBuf::from).unwrap_or_else(|| {
            Config::default_path().unwrap_or_else(|_| PathBuf::from("./config.toml"))
        });
        let mut cfg = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading config at {:?}", path))?;
            Config::parse(&content, is_json(&path))
                .with_context(|| format!("parsing config at {:?}", path))?
        } else {
            Config::default()
        };
        cfg.expand_paths();
        Ok(cfg)
    }

    pub fn parse(content: &str, json: bool) -> Result<Self> {
        let mut cfg: Config = if json {
            serde_json::from_str(content)?
        } else {
            toml::from_str(content)?
        };
        cfg.output.resolve_format();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll.concurrency == 0 {
            anyhow::bail!("poll.concurrency must be at least 1");
        }
        self.static_queries()?;
        Ok(())
    }

    pub fn expand_paths(&mut self) {
        if let Some(file) = &self.logging.file {
            self.logging.file = Some(expand_tilde(file));
        }
    }

    pub fn static_queries(&self) -> Result<Vec<MetricQuery>> {
        self.metrics
            .iter()
            .enumerate()
            .map(|(idx, m)| m.to_query().with_context(|| format!("metrics[{idx}]")))
            .collect()
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            overlapping_points: self.poll.overlapping_points,
            billing_pattern: self.poll.billing_pattern.clone(),
        }
    }

    pub fn formatter(&self, region: Option<&str>) -> Formatter {
        Formatter::new(
            self.output.format,
            Some(self.output.graphite_prefix.as_str()),
            region,
        )
        .with_lowercase(self.output.lowercase)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default, alias = "accessKeyId")]
    pub access_key_id: Option<String>,
    #[serde(default, alias = "secretAccessKey")]
    pub secret_access_key: Option<String>,
}

impl AwsConfig {
    /// Static keys, only when both halves are configured.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsConfig")
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(
        default = "OutputConfig::default_prefix",
        alias = "carbonNameSpacePrefix"
    )]
    pub graphite_prefix: String,
    #[serde(default)]
    pub lowercase: bool,
    /// Boolean switch from older configs; folded into `format` on parse.
    #[serde(default, alias = "legacyFormat", skip_serializing)]
    pub legacy_format: Option<bool>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            graphite_prefix: Self::default_prefix(),
            lowercase: false,
            legacy_format: None,
        }
    }
}

impl OutputConfig {
    fn default_prefix() -> String {
        "cloudwatch".into()
    }

    fn resolve_format(&mut self) {
        match self.legacy_format.take() {
            Some(true) => self.format = OutputFormat::Legacy,
            Some(false) => self.format = OutputFormat::Current,
            None => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "PollConfig::default_lookback", with = "humantime_serde")]
    pub lookback: Duration,
    #[serde(default, alias = "numberOfOverlappingPoints")]
    pub overlapping_points: Option<NonZeroUsize>,
    #[serde(default = "PollConfig::default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "PollConfig::default_billing_pattern")]
    pub billing_pattern: String,
    #[serde(default)]
    pub discover: bool,
    #[serde(default = "PollConfig::default_resource_kinds")]
    pub resource_kinds: Vec<ResourceKind>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            lookback: Self::default_lookback(),
            overlapping_points: None,
            concurrency: Self::default_concurrency(),
            billing_pattern: Self::default_billing_pattern(),
            discover: false,
            resource_kinds: Self::default_resource_kinds(),
        }
    }
}

impl PollConfig {
    fn default_lookback() -> Duration {
        Duration::from_secs(3 * 60)
    }

    fn default_concurrency() -> usize {
        16
    }

    fn default_billing_pattern() -> String {
        DEFAULT_BILLING_PATTERN.into()
    }

    fn default_resource_kinds() -> Vec<ResourceKind> {
        ResourceKind::ALL.to_vec()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".into()
    }
}

/// A statically configured metric. Accepts the CloudWatch request field
/// names as aliases, so `{"Namespace": .., "Statistics": ["Average"]}` works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSpec {
    #[serde(alias = "Namespace")]
    pub namespace: String,
    #[serde(alias = "MetricName")]
    pub metric_name: String,
    #[serde(alias = "Unit")]
    pub unit: String,
    #[serde(
        alias = "Statistic",
        alias = "Statistics",
        alias = "statistics",
        deserialize_with = "single_statistic"
    )]
    pub statistic: String,
    #[serde(default, alias = "Dimensions")]
    pub dimensions: Vec<Dimension>,
    #[serde(default, alias = "Period")]
    pub period: Option<i32>,
}

impl MetricSpec {
    pub fn to_query(&self) -> Result<MetricQuery> {
        Ok(build_query(
            &self.namespace,
            &self.metric_name,
            &self.unit,
            &self.statistic,
            self.dimensions.clone(),
            self.period,
        )?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn single_statistic<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(stat) => Ok(stat),
        OneOrMany::Many(mut stats) if stats.len() == 1 => Ok(stats.remove(0)),
        OneOrMany::Many(stats) => Err(D::Error::custom(format!(
            "expected exactly one statistic, got {}",
            stats.len()
        ))),
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if !path_str.starts_with('~') {
        return path.to_path_buf();
    }

    let home = BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    if path_str == "~" {
        home
    } else {
        let mut expanded = home;
        expanded.push(path_str.trim_start_matches("~/"));
        expanded
    }
}
