use anyhow::{Context, Result};
use clap::Parser;
use cw2graphite_core::{now_utc, Config, Driver, OutputFormat, StdoutSink};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

mod aws;

use aws::AwsCloudWatch;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cw2graphite: print CloudWatch datapoints as Graphite lines"
)]
struct Args {
    /// Path to config file (TOML, or JSON with a .json extension)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also poll every load balancer, RDS instance and ElastiCache cluster
    #[arg(long, visible_alias = "all-elbs")]
    discover: bool,
    /// Override AWS region
    #[arg(long)]
    region: Option<String>,
    /// Output format: current or legacy
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Override how far back to query, e.g. 11m
    #[arg(long)]
    lookback: Option<humantime::Duration>,
    /// Override log filter
    #[arg(long)]
    log_level: Option<String>,
    /// Exit with an error when every query failed
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let _log_guard = init_logging(&config)?;

    let aws = AwsCloudWatch::new(&config.aws).await;
    let region = aws.region().map(str::to_string);
    info!(region = region.as_deref().unwrap_or("<unset>"), "starting cw2graphite");

    let sink = StdoutSink;
    let mut driver = Driver::from_config(&config, &aws, &sink, region.as_deref())?;
    if config.poll.discover {
        driver = driver.with_lister(&aws);
    }

    let summary = driver.run(now_utc()).await;
    if args.strict && summary.all_failed() {
        anyhow::bail!("all {} queries failed", summary.queries);
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if args.discover {
        config.poll.discover = true;
    }
    if let Some(region) = &args.region {
        config.aws.region = Some(region.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(lookback) = args.lookback {
        config.poll.lookback = *lookback;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
}

/// The returned guard flushes the log file when dropped.
fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    let mut guard = None;
    let writer: BoxMakeWriter = if let Some(path) = &config.logging.file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file at {:?}", path))?;
        let (writer, file_guard) = tracing_appender::non_blocking(file);
        guard = Some(file_guard);
        BoxMakeWriter::new(writer)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.clone())
        .with_ansi(config.logging.file.is_none() && atty::is(atty::Stream::Stderr))
        .with_target(false)
        .with_level(true)
        .with_writer(writer)
        .finish()
        .try_init()
        .ok();
    Ok(guard)
}
