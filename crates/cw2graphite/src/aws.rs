//! AWS SDK binding for the metric source and resource lister traits.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudwatch::config::Credentials;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{
    Datapoint as AwsDatapoint, Dimension as AwsDimension, StandardUnit, Statistic,
};
use cw2graphite_core::timeutils::utc_from_timestamp;
use cw2graphite_core::{
    AwsConfig, CacheNode, Datapoint, MetricQuery, MetricSource, ResourceLister, TimeWindow,
};
use time::OffsetDateTime;
use tracing::debug;

/// CloudWatch plus the ELB, RDS and ElastiCache clients used for discovery,
/// all built from one loaded SDK config.
pub struct AwsCloudWatch {
    cloudwatch: aws_sdk_cloudwatch::Client,
    elb: aws_sdk_elasticloadbalancing::Client,
    rds: aws_sdk_rds::Client,
    elasticache: aws_sdk_elasticache::Client,
    region: Option<String>,
}

impl AwsCloudWatch {
    /// Loads credentials and region from the config file, falling back to
    /// the default AWS provider chain.
    pub async fn new(aws: &AwsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &aws.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &aws.profile {
            loader = loader.profile_name(profile);
        }
        if let Some((id, secret)) = aws.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                id,
                secret,
                None,
                None,
                "cw2graphite-config",
            ));
        }
        let config = loader.load().await;
        Self::from_sdk_config(&config)
    }

    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self {
            cloudwatch: aws_sdk_cloudwatch::Client::new(config),
            elb: aws_sdk_elasticloadbalancing::Client::new(config),
            rds: aws_sdk_rds::Client::new(config),
            elasticache: aws_sdk_elasticache::Client::new(config),
            region: config.region().map(|r| r.to_string()),
        }
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl std::fmt::Debug for AwsCloudWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCloudWatch")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetricSource for AwsCloudWatch {
    async fn get_metric_statistics(
        &self,
        query: &MetricQuery,
        window: &TimeWindow,
    ) -> Result<Option<Vec<Datapoint>>> {
        let dimensions = query
            .dimensions
            .iter()
            .map(|d| AwsDimension::builder().name(&d.name).value(&d.value).build())
            .collect();

        let mut request = self
            .cloudwatch
            .get_metric_statistics()
            .namespace(&query.namespace)
            .metric_name(&query.metric_name)
            .set_dimensions(Some(dimensions))
            .start_time(to_aws_time(window.start))
            .end_time(to_aws_time(window.end))
            .period(query.period)
            .statistics(Statistic::from(query.statistic.as_str()));
        if !query.unit.is_empty() {
            request = request.unit(StandardUnit::from(query.unit.as_str()));
        }

        let output = request
            .send()
            .await
            .context("GetMetricStatistics request failed")?;

        let Some(raw) = output.datapoints else {
            return Ok(None);
        };
        let mut points = Vec::with_capacity(raw.len());
        for point in &raw {
            match convert_datapoint(point, &query.statistic)? {
                Some(p) => points.push(p),
                None => debug!(query = %query, "datapoint without {} value", query.statistic),
            }
        }
        Ok(Some(points))
    }
}

#[async_trait]
impl ResourceLister for AwsCloudWatch {
    async fn load_balancer_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let output = self
                .elb
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .context("DescribeLoadBalancers request failed")?;
            names.extend(
                output
                    .load_balancer_descriptions()
                    .iter()
                    .filter_map(|lb| lb.load_balancer_name().map(str::to_string)),
            );
            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        debug!(count = names.len(), "listed load balancers");
        Ok(names)
    }

    async fn database_instance_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let output = self
                .rds
                .describe_db_instances()
                .set_marker(marker.take())
                .send()
                .await
                .context("DescribeDBInstances request failed")?;
            ids.extend(
                output
                    .db_instances()
                    .iter()
                    .filter_map(|db| db.db_instance_identifier().map(str::to_string)),
            );
            match output.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        debug!(count = ids.len(), "listed database instances");
        Ok(ids)
    }

    async fn cache_cluster_nodes(&self) -> Result<Vec<CacheNode>> {
        let mut nodes = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let output = self
                .elasticache
                .describe_cache_clusters()
                .show_cache_node_info(true)
                .set_marker(marker.take())
                .send()
                .await
                .context("DescribeCacheClusters request failed")?;
            for cluster in output.cache_clusters() {
                let Some(cluster_id) = cluster.cache_cluster_id() else {
                    continue;
                };
                match cluster.cache_nodes().first().and_then(|n| n.cache_node_id()) {
                    Some(node_id) => nodes.push(CacheNode::new(cluster_id, node_id)),
                    None => debug!(cluster = cluster_id, "cache cluster has no nodes"),
                }
            }
            match output.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        debug!(count = nodes.len(), "listed cache clusters");
        Ok(nodes)
    }
}

fn to_aws_time(ts: OffsetDateTime) -> AwsDateTime {
    AwsDateTime::from_secs(ts.unix_timestamp())
}

fn convert_datapoint(point: &AwsDatapoint, statistic: &str) -> Result<Option<Datapoint>> {
    let Some(ts) = point.timestamp() else {
        return Ok(None);
    };
    let value = match statistic {
        "Average" => point.average(),
        "Sum" => point.sum(),
        "Minimum" => point.minimum(),
        "Maximum" => point.maximum(),
        "SampleCount" => point.sample_count(),
        _ => None,
    };
    let Some(value) = value else {
        return Ok(None);
    };
    let timestamp = utc_from_timestamp(ts.secs(), ts.subsec_nanos())?;
    Ok(Some(Datapoint::new(timestamp, value)))
}
