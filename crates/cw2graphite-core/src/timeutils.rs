use anyhow::{Context, Result};
use std::time::Duration as StdDuration;
use time::{Duration, OffsetDateTime};

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn utc_from_timestamp(secs: i64, subsec_nanos: u32) -> Result<OffsetDateTime> {
    let ts = OffsetDateTime::from_unix_timestamp(secs)
        .with_context(|| format!("timestamp {secs} out of range"))?;
    Ok(ts + Duration::nanoseconds(i64::from(subsec_nanos)))
}

/// Whole seconds since the epoch, i.e. floor(millis / 1000).
pub fn epoch_seconds(ts: OffsetDateTime) -> i64 {
    let millis = ts.unix_timestamp_nanos().div_euclid(1_000_000);
    millis.div_euclid(1000) as i64
}

pub fn duration_from_std(std: StdDuration) -> Duration {
    Duration::new(std.as_secs() as i64, std.subsec_nanos() as i32)
}
