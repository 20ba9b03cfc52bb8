use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::models::{Dimension, MetricQuery};
use crate::query::build_query;

pub const ELB_NAMESPACE: &str = "AWS/ELB";
pub const RDS_NAMESPACE: &str = "AWS/RDS";
pub const ELASTICACHE_NAMESPACE: &str = "AWS/ElastiCache";

/// (metric name, unit, statistic)
const ELB_METRICS: &[(&str, &str, &str)] = &[
    ("Latency", "Seconds", "Average"),
    ("HealthyHostCount", "Count", "Average"),
    ("UnHealthyHostCount", "Count", "Average"),
    ("HTTPCode_Backend_2XX", "Count", "Sum"),
    ("HTTPCode_Backend_3XX", "Count", "Sum"),
    ("HTTPCode_Backend_4XX", "Count", "Sum"),
    ("HTTPCode_Backend_5XX", "Count", "Sum"),
    ("HTTPCode_ELB_4XX", "Count", "Sum"),
    ("HTTPCode_ELB_5XX", "Count", "Sum"),
];

const RDS_METRICS: &[(&str, &str, &str)] = &[
    ("CPUUtilization", "Percent", "Average"),
    ("DatabaseConnections", "Count", "Average"),
];

const CACHE_BYTE_METRICS: &[&str] = &[
    "UnusedMemory",
    "FreeableMemory",
    "NetworkBytesIn",
    "NetworkBytesOut",
];

const CACHE_COUNT_METRICS: &[&str] = &[
    "CurrConnections",
    "CurrItems",
    "Evictions",
    "Reclaimed",
    "GetHits",
    "CacheHits",
    "GetMisses",
    "CacheMisses",
    "GetTypeCmds",
    "SetTypeCmds",
    "CmdGet",
    "CmdSet",
    "DeleteHits",
    "DeleteMisses",
    "NewItems",
    "NewConnections",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    LoadBalancers,
    DatabaseInstances,
    CacheClusters,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::LoadBalancers,
        ResourceKind::DatabaseInstances,
        ResourceKind::CacheClusters,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::LoadBalancers => "load balancers",
            ResourceKind::DatabaseInstances => "database instances",
            ResourceKind::CacheClusters => "cache clusters",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNode {
    pub cluster_id: String,
    pub node_id: String,
}

impl CacheNode {
    pub fn new<C: Into<String>, N: Into<String>>(cluster_id: C, node_id: N) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            node_id: node_id.into(),
        }
    }
}

#[async_trait]
pub trait ResourceLister: Send + Sync {
    async fn load_balancer_names(&self) -> Result<Vec<String>>;

    async fn database_instance_ids(&self) -> Result<Vec<String>>;

    /// One entry per cache cluster, carrying only its first node.
    async fn cache_cluster_nodes(&self) -> Result<Vec<CacheNode>>;
}

/// A failed listing is logged and treated as "no resources of this kind".
pub async fn discover(lister: &dyn ResourceLister, kind: ResourceKind) -> Vec<MetricQuery> {
    let queries = match kind {
        ResourceKind::LoadBalancers => match lister.load_balancer_names().await {
            Ok(names) => names.iter().flat_map(|n| load_balancer_queries(n)).collect(),
            Err(err) => {
                warn!(%kind, "listing failed: {err:#}");
                Vec::new()
            }
        },
        ResourceKind::DatabaseInstances => match lister.database_instance_ids().await {
            Ok(ids) => ids.iter().flat_map(|id| database_queries(id)).collect(),
            Err(err) => {
                warn!(%kind, "listing failed: {err:#}");
                Vec::new()
            }
        },
        ResourceKind::CacheClusters => match lister.cache_cluster_nodes().await {
            Ok(nodes) => nodes.iter().flat_map(cache_node_queries).collect(),
            Err(err) => {
                warn!(%kind, "listing failed: {err:#}");
                Vec::new()
            }
        },
    };
    debug!(%kind, queries = queries.len(), "expanded discovered resources");
    queries
}

pub fn load_balancer_queries(name: &str) -> Vec<MetricQuery> {
    let dims = vec![Dimension::new("LoadBalancerName", name)];
    expand(ELB_NAMESPACE, ELB_METRICS.iter().copied(), &dims)
}

pub fn database_queries(instance_id: &str) -> Vec<MetricQuery> {
    let dims = vec![Dimension::new("DBInstanceIdentifier", instance_id)];
    expand(RDS_NAMESPACE, RDS_METRICS.iter().copied(), &dims)
}

pub fn cache_node_queries(node: &CacheNode) -> Vec<MetricQuery> {
    let dims = vec![
        Dimension::new("CacheClusterId", node.cluster_id.as_str()),
        Dimension::new("CacheNodeId", node.node_id.as_str()),
    ];
    let metrics = std::iter::once(("CPUUtilization", "Percent", "Average"))
        .chain(CACHE_BYTE_METRICS.iter().map(|m| (*m, "Bytes", "Average")))
        .chain(CACHE_COUNT_METRICS.iter().map(|m| (*m, "Count", "Average")));
    expand(ELASTICACHE_NAMESPACE, metrics, &dims)
}

fn expand<'a>(
    namespace: &str,
    metrics: impl Iterator<Item = (&'a str, &'a str, &'a str)>,
    dims: &[Dimension],
) -> Vec<MetricQuery> {
    let mut queries = Vec::new();
    for (metric, unit, statistic) in metrics {
        match build_query(namespace, metric, unit, statistic, dims.to_vec(), None) {
            Ok(query) => queries.push(query),
            Err(err) => {
                // an empty identifier invalidates every metric of the resource
                warn!("skipping discovered resource: {err}");
                break;
            }
        }
    }
    queries
}
