//! Tests for types module

use crate::types::{
    ChartAxis, ChartDataPoint, ChartKind, ChartType, MessageContent, MetricChart, QueryResponse,
    TimeRange, UserQuery,
};

fn sample_chart() -> MetricChart {
    MetricChart::line(
        "rate(http_requests_total[5m])",
        ChartAxis::new("Time", "date"),
        ChartAxis::new("Value", "number"),
        vec![
            ChartDataPoint::new("1718000000", "0.5"),
            ChartDataPoint::new("1718000015", "0.75"),
        ],
    )
}

#[test]
fn test_chart_wire_field_names() {
    let json = serde_json::to_value(sample_chart()).unwrap();

    assert_eq!(json["type"], "chart");
    assert_eq!(json["chartType"], "line");
    assert_eq!(json["title"], "rate(http_requests_total[5m])");
    assert_eq!(json["crossAxis"]["label"], "Time");
    assert_eq!(json["crossAxis"]["unit_or_type"], "date");
    assert_eq!(json["dependentAxis"]["unit_or_type"], "number");
    assert_eq!(json["data"][1]["x"], "1718000015");
    assert_eq!(json["data"][1]["y"], "0.75");
}

#[test]
fn test_chart_wire_roundtrip_preserves_order() {
    let chart = sample_chart();
    let text = serde_json::to_string(&chart).unwrap();
    let parsed: MetricChart = serde_json::from_str(&text).unwrap();

    assert_eq!(parsed.title, chart.title);
    assert_eq!(parsed.cross_axis, chart.cross_axis);
    assert_eq!(parsed.dependent_axis, chart.dependent_axis);
    assert_eq!(parsed.data, chart.data);
    assert_eq!(parsed.kind, ChartKind::Chart);
    assert_eq!(parsed.chart_type, ChartType::Line);
}

#[test]
fn test_chart_kind_defaults_when_missing() {
    let parsed: MetricChart = serde_json::from_value(serde_json::json!({
        "title": "up",
        "crossAxis": {"label": "Time", "unit_or_type": "date"},
        "dependentAxis": {"label": "Value", "unit_or_type": "number"},
        "data": []
    }))
    .unwrap();

    assert_eq!(parsed.kind, ChartKind::Chart);
    assert_eq!(parsed.chart_type, ChartType::Line);
    assert!(parsed.data.is_empty());
}

#[test]
fn test_user_query_requires_query() {
    assert!(serde_json::from_str::<UserQuery>(r#"{"query": "cpu usage"}"#).is_ok());
    assert!(serde_json::from_str::<UserQuery>(r#"{"question": "cpu usage"}"#).is_err());
    assert!(serde_json::from_str::<UserQuery>(r#"{"query": 42}"#).is_err());
}

#[test]
fn test_message_content_untagged() {
    let text: MessageContent = serde_json::from_str(r#""hello""#).unwrap();
    assert_eq!(text, MessageContent::Text("hello".to_string()));

    let structured: MessageContent =
        serde_json::from_str(r#"[{"type": "text", "text": "hi"}]"#).unwrap();
    assert!(matches!(structured, MessageContent::Structured(_)));
    assert_eq!(structured.to_text(), "hi");

    assert_eq!(serde_json::to_string(&text).unwrap(), r#""hello""#);
}

#[test]
fn test_message_content_to_text_nested() {
    let content = MessageContent::Structured(serde_json::json!([
        {"type": "text", "text": "first"},
        {"type": "image", "image": {"url": "http://x"}},
        {"type": "text", "text": "second"}
    ]));
    let text = content.to_text();
    assert!(text.starts_with("first\n"));
    assert!(text.ends_with("\nsecond"));
}

#[test]
fn test_message_content_is_empty() {
    assert!(MessageContent::default().is_empty());
    assert!(MessageContent::Structured(serde_json::Value::Null).is_empty());
    assert!(!MessageContent::from("x").is_empty());
}

#[test]
fn test_query_response_shape() {
    let response = QueryResponse {
        llm_responses: "CPU is fine".into(),
        charts_and_graphs: vec![sample_chart()],
    };
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["llm_responses"], "CPU is fine");
    assert_eq!(json["charts_and_graphs"].as_array().unwrap().len(), 1);
}

#[test]
fn test_time_range_last_minutes() {
    let range = TimeRange::last_minutes(5).unwrap();
    let now = chrono::Utc::now();

    // End should be close to now
    assert!((range.end - now).num_seconds().abs() < 2);

    let duration = range.end - range.start;
    assert_eq!(duration.num_minutes(), 5);
}

#[test]
fn test_time_range_last_minutes_out_of_bounds() {
    assert!(TimeRange::last_minutes(1_000_000_000_000_000).is_none());
    assert!(TimeRange::last_minutes(i64::MAX).is_none());
}
