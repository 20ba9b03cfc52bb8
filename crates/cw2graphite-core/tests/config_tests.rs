use cw2graphite_core::{Config, OutputFormat, ResourceKind};
use std::io::Write;
use std::time::Duration;
use tempfile::Builder;

#[test]
fn missing_file_yields_defaults() {
    let cfg = Config::load(Some(std::path::Path::new("/nonexistent/cw2graphite.toml")))
        .expect("load default config");
    assert_eq!(cfg.output.format, OutputFormat::Current);
    assert_eq!(cfg.output.graphite_prefix, "cloudwatch");
    assert_eq!(cfg.poll.lookback, Duration::from_secs(180));
    assert_eq!(cfg.poll.overlapping_points, None);
    assert_eq!(cfg.poll.billing_pattern, "Billing");
    assert!(!cfg.poll.discover);
    assert_eq!(cfg.poll.resource_kinds, ResourceKind::ALL.to_vec());
    assert!(cfg.metrics.is_empty());
}

#[test]
fn parses_toml_with_static_metrics() {
    let cfg = Config::parse(
        r#"
        [aws]
        region = "eu-west-1"

        [output]
        format = "legacy"
        graphite_prefix = "aws.{region}"

        [poll]
        lookback = "11m"
        overlapping_points = 3
        discover = true
        resource_kinds = ["load_balancers"]

        [[metrics]]
        namespace = "AWS/SQS"
        metric_name = "ApproximateNumberOfMessagesVisible"
        unit = "Count"
        statistic = "Average"
        dimensions = [{ name = "QueueName", value = "jobs" }]
        period = 300
        "#,
        false,
    )
    .expect("parse toml");

    assert_eq!(cfg.aws.region.as_deref(), Some("eu-west-1"));
    assert_eq!(cfg.output.format, OutputFormat::Legacy);
    assert_eq!(cfg.poll.lookback, Duration::from_secs(660));
    assert_eq!(cfg.poll.overlapping_points.map(|n| n.get()), Some(3));
    assert_eq!(cfg.poll.resource_kinds, vec![ResourceKind::LoadBalancers]);

    let queries = cfg.static_queries().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].period, 300);
    assert_eq!(queries[0].dimensions[0].value, "jobs");

    let path = cfg.formatter(Some("eu-west-1")).metric_path(&queries[0]);
    assert_eq!(
        path,
        "aws.eu-west-1.aws.sqs.jobs.approximatenumberofmessagesvisible.average.count"
    );
}

#[test]
fn json_accepts_cloudwatch_field_names() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "output": {{ "carbonNameSpacePrefix": "cw", "legacyFormat": true }},
            "poll": {{ "numberOfOverlappingPoints": 2 }},
            "metrics": [{{
                "Namespace": "AWS/Billing",
                "MetricName": "EstimatedCharges",
                "Unit": "None",
                "Statistics": ["Maximum"],
                "Dimensions": [{{ "Name": "Currency", "Value": "USD" }}]
            }}]
        }}"#
    )
    .unwrap();

    let cfg = Config::load(Some(file.path())).expect("load json config");
    assert_eq!(cfg.output.graphite_prefix, "cw");
    assert_eq!(cfg.output.format, OutputFormat::Legacy);
    assert_eq!(cfg.output.legacy_format, None);
    assert_eq!(cfg.poll.overlapping_points.map(|n| n.get()), Some(2));
    let queries = cfg.static_queries().unwrap();
    assert_eq!(queries[0].statistic, "Maximum");
    assert_eq!(queries[0].period, 60);
    assert_eq!(queries[0].dimensions[0].name, "Currency");
}

#[test]
fn rejects_multiple_statistics() {
    let err = Config::parse(
        r#"
        [[metrics]]
        namespace = "AWS/ELB"
        metric_name = "Latency"
        unit = "Seconds"
        statistics = ["Average", "Maximum"]
        "#,
        false,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("exactly one statistic"));
}

#[test]
fn rejects_invalid_metric_and_zero_overlap() {
    let empty_name = Config::parse(
        r#"
        [[metrics]]
        namespace = "AWS/ELB"
        metric_name = ""
        unit = "Seconds"
        statistic = "Average"
        "#,
        false,
    );
    assert!(empty_name.is_err());

    let zero_overlap = Config::parse("[poll]\noverlapping_points = 0\n", false);
    assert!(zero_overlap.is_err());
}

#[test]
fn static_credentials_need_both_halves() {
    let cfg = Config::parse(
        "[aws]\naccess_key_id = \"AKIDEXAMPLE\"\nsecret_access_key = \"s3cr3t\"\n",
        false,
    )
    .unwrap();
    assert_eq!(
        cfg.aws.static_credentials(),
        Some(("AKIDEXAMPLE", "s3cr3t"))
    );
    assert!(!format!("{:?}", cfg.aws).contains("s3cr3t"));

    let partial = Config::parse("[aws]\naccess_key_id = \"AKIDEXAMPLE\"\n", false).unwrap();
    assert_eq!(partial.aws.static_credentials(), None);
}
