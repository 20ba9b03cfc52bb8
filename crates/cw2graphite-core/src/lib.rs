pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod format;
pub mod models;
pub mod query;
pub mod resources;
pub mod sink;
pub mod timeutils;

pub use config::{AwsConfig, Config, LoggingConfig, MetricSpec, OutputConfig, PollConfig};
pub use driver::{Driver, DriverSettings, QueryOutcome, RunSummary};
pub use error::PollError;
pub use fetch::{sort_and_trim, FetchSettings, Fetcher, MetricSource};
pub use format::{Formatter, OutputFormat};
pub use models::{Datapoint, Dimension, MetricQuery, TimeWindow};
pub use query::build_query;
pub use resources::{discover, CacheNode, ResourceKind, ResourceLister};
pub use sink::{LineSink, MemorySink, StdoutSink};
pub use timeutils::{epoch_seconds, now_utc};
