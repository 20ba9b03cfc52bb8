#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use cw2graphite_core::{
    CacheNode, Datapoint, MetricQuery, MetricSource, ResourceLister, TimeWindow,
};
use std::collections::HashMap;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};

/// Answers every request with the datapoints registered for its metric name.
/// Metrics listed in `failing` return an error; unknown metrics return `None`.
#[derive(Default)]
pub struct FakeSource {
    pub responses: HashMap<String, Vec<Datapoint>>,
    pub failing: Vec<String>,
    pub requests: Mutex<Vec<(MetricQuery, TimeWindow)>>,
}

impl FakeSource {
    pub fn with(mut self, metric: &str, points: Vec<Datapoint>) -> Self {
        self.responses.insert(metric.to_string(), points);
        self
    }

    pub fn failing(mut self, metric: &str) -> Self {
        self.failing.push(metric.to_string());
        self
    }

    pub fn requests(&self) -> Vec<(MetricQuery, TimeWindow)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricSource for FakeSource {
    async fn get_metric_statistics(
        &self,
        query: &MetricQuery,
        window: &TimeWindow,
    ) -> Result<Option<Vec<Datapoint>>> {
        self.requests
            .lock()
            .unwrap()
            .push((query.clone(), *window));
        if self.failing.contains(&query.metric_name) {
            anyhow::bail!("throttled");
        }
        Ok(self.responses.get(&query.metric_name).cloned())
    }
}

/// `None` makes the corresponding listing call fail.
#[derive(Default)]
pub struct FakeLister {
    pub load_balancers: Option<Vec<String>>,
    pub databases: Option<Vec<String>>,
    pub cache_nodes: Option<Vec<CacheNode>>,
}

#[async_trait]
impl ResourceLister for FakeLister {
    async fn load_balancer_names(&self) -> Result<Vec<String>> {
        self.load_balancers
            .clone()
            .ok_or_else(|| anyhow::anyhow!("DescribeLoadBalancers denied"))
    }

    async fn database_instance_ids(&self) -> Result<Vec<String>> {
        self.databases
            .clone()
            .ok_or_else(|| anyhow::anyhow!("DescribeDBInstances denied"))
    }

    async fn cache_cluster_nodes(&self) -> Result<Vec<CacheNode>> {
        self.cache_nodes
            .clone()
            .ok_or_else(|| anyhow::anyhow!("DescribeCacheClusters denied"))
    }
}

pub fn point(base: OffsetDateTime, minutes: i64, value: f64) -> Datapoint {
    Datapoint::new(base + Duration::minutes(minutes), value)
}
