use cw2graphite_core::{build_query, Datapoint, Dimension, Formatter, MetricQuery, OutputFormat};
use time::macros::datetime;

fn elb_latency() -> MetricQuery {
    build_query(
        "AWS/ELB",
        "Latency",
        "Seconds",
        "Average",
        vec![Dimension::new("LoadBalancerName", "my-elb")],
        None,
    )
    .unwrap()
}

fn sample() -> Vec<Datapoint> {
    vec![Datapoint::new(datetime!(2024-01-01 0:00:30 UTC), 0.042)]
}

#[test]
fn current_format_keeps_dimension_names_and_case() {
    let lines = Formatter::current().format(&elb_latency(), &sample());
    assert_eq!(
        lines,
        vec!["AWS.ELB.LoadBalancerName_my-elb.Latency 0.042 1704067230"]
    );
}

#[test]
fn current_format_lowercased_matches_worked_example() {
    let lines = Formatter::current()
        .with_lowercase(true)
        .format(&elb_latency(), &sample());
    assert_eq!(lines, vec!["aws.elb.loadbalancername_my-elb.latency 0.042 1704067230"]);
}

#[test]
fn legacy_format_without_prefix() {
    let lines = Formatter::legacy(None, None).format(&elb_latency(), &sample());
    assert_eq!(lines, vec!["aws.elb.my-elb.latency.average.seconds 0.042 1704067230"]);

    let empty = Formatter::legacy(Some(""), None).format(&elb_latency(), &sample());
    assert_eq!(empty, lines);
}

#[test]
fn legacy_prefix_substitutes_region_and_lowercases() {
    let formatter = Formatter::legacy(Some("CloudWatch.{region}"), Some("eu-west-1"));
    let lines = formatter.format(&elb_latency(), &sample());
    assert_eq!(
        lines,
        vec!["cloudwatch.eu-west-1.aws.elb.my-elb.latency.average.seconds 0.042 1704067230"]
    );
}

#[test]
fn suffixes_depend_on_format() {
    let query = build_query(
        "AWS/ElastiCache",
        "FreeableMemory",
        "Bytes",
        "Average",
        vec![
            Dimension::new("CacheClusterId", "Sessions"),
            Dimension::new("CacheNodeId", "0001"),
        ],
        None,
    )
    .unwrap();

    let current = Formatter::current().metric_path(&query);
    assert_eq!(
        current,
        "AWS.ElastiCache.CacheClusterId_Sessions.CacheNodeId_0001.FreeableMemory"
    );
    assert!(!current.ends_with(".Bytes"));
    assert!(!current.contains("Average"));

    let legacy = Formatter::legacy(Some("cloudwatch"), None).metric_path(&query);
    assert_eq!(
        legacy,
        "cloudwatch.aws.elasticache.sessions.0001.freeablememory.average.bytes"
    );
    assert_eq!(legacy, legacy.to_lowercase());
}

#[test]
fn zero_dimensions_leave_no_empty_segment() {
    let query = build_query("Custom/App", "Requests", "Count", "Sum", vec![], None).unwrap();
    let current = Formatter::current().metric_path(&query);
    let legacy = Formatter::legacy(None, None).metric_path(&query);
    assert_eq!(current, "Custom.App.Requests");
    assert_eq!(legacy, "custom.app.requests.sum.count");
    for path in [current, legacy] {
        assert!(!path.contains(".."));
        assert!(!path.starts_with('.') && !path.ends_with('.'));
    }
}

#[test]
fn legacy_path_skips_an_empty_unit() {
    let query = build_query("AWS/ELB", "Latency", "", "Average", vec![], None).unwrap();
    let path = Formatter::legacy(None, None).metric_path(&query);
    assert_eq!(path, "aws.elb.latency.average");

    let prefixed = Formatter::legacy(Some("cw"), None).metric_path(&query);
    assert_eq!(prefixed, "cw.aws.elb.latency.average");
}

#[test]
fn every_slash_in_namespace_becomes_a_dot() {
    let query = build_query("Team/Service/Api", "Errors", "Count", "Sum", vec![], None).unwrap();
    assert_eq!(Formatter::current().metric_path(&query), "Team.Service.Api.Errors");
}

#[test]
fn lines_follow_input_order_and_floor_seconds() {
    let query = build_query("AWS/RDS", "DatabaseConnections", "Count", "Average", vec![], None)
        .unwrap();
    let points = vec![
        Datapoint::new(datetime!(2024-01-01 0:01:00.999 UTC), 5.0),
        Datapoint::new(datetime!(2024-01-01 0:02:00 UTC), 7.5),
    ];
    let lines = Formatter::current().format(&query, &points);
    assert_eq!(
        lines,
        vec![
            "AWS.RDS.DatabaseConnections 5 1704067260",
            "AWS.RDS.DatabaseConnections 7.5 1704067320",
        ]
    );
}

#[test]
fn legacy_lowercase_flag_is_ignored() {
    let formatter = Formatter::legacy(None, None).with_lowercase(false);
    assert_eq!(
        formatter.metric_path(&elb_latency()),
        "aws.elb.my-elb.latency.average.seconds"
    );
}

#[test]
fn format_names_parse() {
    assert_eq!("legacy".parse::<OutputFormat>().unwrap(), OutputFormat::Legacy);
    assert_eq!("Current".parse::<OutputFormat>().unwrap(), OutputFormat::Current);
    assert!("graphite".parse::<OutputFormat>().is_err());
    assert_eq!(
        Formatter::new(OutputFormat::Legacy, Some("cw"), None).output_format(),
        OutputFormat::Legacy
    );
}
