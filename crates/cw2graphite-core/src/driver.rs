use anyhow::Result;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::PollError;
use crate::fetch::{FetchSettings, Fetcher, MetricSource};
use crate::format::Formatter;
use crate::models::{MetricQuery, TimeWindow};
use crate::resources::{discover, ResourceKind, ResourceLister};
use crate::sink::LineSink;
use crate::timeutils::duration_from_std;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Emitted(usize),
    NoData,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub queries: usize,
    pub emitted: usize,
    pub no_data: usize,
    pub failed: usize,
    pub lines: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: QueryOutcome) {
        self.queries += 1;
        match outcome {
            QueryOutcome::Emitted(lines) => {
                self.emitted += 1;
                self.lines += lines;
            }
            QueryOutcome::NoData => self.no_data += 1,
            QueryOutcome::Failed => self.failed += 1,
        }
    }

    pub fn merge(self, other: RunSummary) -> RunSummary {
        RunSummary {
            queries: self.queries + other.queries,
            emitted: self.emitted + other.emitted,
            no_data: self.no_data + other.no_data,
            failed: self.failed + other.failed,
            lines: self.lines + other.lines,
        }
    }

    /// True when something ran and nothing succeeded or came back empty.
    pub fn all_failed(&self) -> bool {
        self.queries > 0 && self.failed == self.queries
    }
}

#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub lookback: Duration,
    /// In-flight fetches per work stream (static metrics, each resource kind).
    pub concurrency: usize,
    pub discover: bool,
    pub resource_kinds: Vec<ResourceKind>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            lookback: Duration::minutes(3),
            concurrency: 16,
            discover: false,
            resource_kinds: ResourceKind::ALL.to_vec(),
        }
    }
}

pub struct Driver<'a> {
    fetcher: Fetcher<'a>,
    lister: Option<&'a dyn ResourceLister>,
    formatter: Formatter,
    sink: &'a dyn LineSink,
    static_queries: Vec<MetricQuery>,
    settings: DriverSettings,
}

impl<'a> Driver<'a> {
    pub fn new(
        source: &'a dyn MetricSource,
        sink: &'a dyn LineSink,
        formatter: Formatter,
        fetch: FetchSettings,
        settings: DriverSettings,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(source, fetch),
            lister: None,
            formatter,
            sink,
            static_queries: Vec::new(),
            settings,
        }
    }

    pub fn from_config(
        config: &Config,
        source: &'a dyn MetricSource,
        sink: &'a dyn LineSink,
        region: Option<&str>,
    ) -> Result<Self> {
        let settings = DriverSettings {
            lookback: duration_from_std(config.poll.lookback),
            concurrency: config.poll.concurrency.max(1),
            discover: config.poll.discover,
            resource_kinds: config.poll.resource_kinds.clone(),
        };
        let driver = Driver::new(
            source,
            sink,
            config.formatter(region),
            config.fetch_settings(),
            settings,
        )
        .with_static_queries(config.static_queries()?);
        Ok(driver)
    }

    pub fn with_lister(mut self, lister: &'a dyn ResourceLister) -> Self {
        self.lister = Some(lister);
        self
    }

    pub fn with_static_queries(mut self, queries: Vec<MetricQuery>) -> Self {
        self.static_queries = queries;
        self
    }

    /// Polls static and discovered metrics for the window ending at `now`.
    ///
    /// Static metrics and each resource kind proceed independently; the
    /// summary is returned once every outstanding call has resolved.
    pub async fn run(&self, now: OffsetDateTime) -> RunSummary {
        let window = TimeWindow::ending_at(now, self.settings.lookback);
        info!(
            %window,
            static_metrics = self.static_queries.len(),
            discover = self.settings.discover,
            "polling cloudwatch"
        );

        let (configured, discovered) = futures::join!(
            self.poll_all(self.static_queries.clone(), &window),
            self.poll_discovered(&window)
        );
        let summary = configured.merge(discovered);
        info!(
            queries = summary.queries,
            emitted = summary.emitted,
            no_data = summary.no_data,
            failed = summary.failed,
            lines = summary.lines,
            "poll finished"
        );
        summary
    }

    async fn poll_discovered(&self, window: &TimeWindow) -> RunSummary {
        let Some(lister) = self.lister.filter(|_| self.settings.discover) else {
            return RunSummary::default();
        };
        let runs = self.settings.resource_kinds.iter().map(|kind| async move {
            let queries = discover(lister, *kind).await;
            debug!(%kind, queries = queries.len(), "discovered");
            self.poll_all(queries, window).await
        });
        join_all(runs)
            .await
            .into_iter()
            .fold(RunSummary::default(), RunSummary::merge)
    }

    async fn poll_all(&self, queries: Vec<MetricQuery>, window: &TimeWindow) -> RunSummary {
        stream::iter(queries)
            .map(|query| async move { self.poll_one(&query, window).await })
            .buffer_unordered(self.settings.concurrency.max(1))
            .fold(RunSummary::default(), |mut summary, outcome| async move {
                summary.record(outcome);
                summary
            })
            .await
    }

    /// Fetches, formats and writes one query. Failures stay local to it.
    pub async fn poll_one(&self, query: &MetricQuery, window: &TimeWindow) -> QueryOutcome {
        match self.fetcher.fetch(query, window).await {
            Ok(points) => {
                let lines = self.formatter.format(query, &points);
                self.sink.write_lines(&lines);
                QueryOutcome::Emitted(lines.len())
            }
            Err(err @ PollError::NoData { .. }) => {
                warn!("{err}");
                QueryOutcome::NoData
            }
            Err(err) => {
                error!(request = err.request().unwrap_or_default(), "{err}");
                QueryOutcome::Failed
            }
        }
    }
}
