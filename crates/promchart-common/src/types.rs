//! Core types for promchart
//!
//! These types define the JSON wire format shared by the API server and its
//! clients. Field names follow the chart schema the front end consumes, which
//! is why several of them are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind tag carried by every chart record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Chart,
}

/// Rendering style of a chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartType::Line => write!(f, "line"),
        }
    }
}

/// One chart dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartAxis {
    /// Axis title
    pub label: String,
    /// Unit or value kind, e.g. `date` or `cores`
    pub unit_or_type: String,
}

impl ChartAxis {
    /// Axis from a label and a unit
    pub fn new(label: impl Into<String>, unit_or_type: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            unit_or_type: unit_or_type.into(),
        }
    }
}

/// One sample. Coordinates are kept as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    /// Sample timestamp as sent by Prometheus
    pub x: String,
    /// Sample value as sent by Prometheus
    pub y: String,
}

impl ChartDataPoint {
    /// Point from raw coordinates
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

/// A line chart built from one metric series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricChart {
    /// Always `chart`
    #[serde(rename = "type", default)]
    pub kind: ChartKind,

    /// Always `line`
    #[serde(default)]
    pub chart_type: ChartType,

    /// Chart title. Not unique: every series of one query shares it.
    pub title: String,

    /// Horizontal axis (time)
    pub cross_axis: ChartAxis,

    /// Vertical axis (sample value)
    pub dependent_axis: ChartAxis,

    /// Points in the order the backend returned them
    pub data: Vec<ChartDataPoint>,
}

impl MetricChart {
    /// Create a line chart
    pub fn line(
        title: impl Into<String>,
        cross_axis: ChartAxis,
        dependent_axis: ChartAxis,
        data: Vec<ChartDataPoint>,
    ) -> Self {
        Self {
            kind: ChartKind::Chart,
            chart_type: ChartType::Line,
            title: title.into(),
            cross_axis,
            dependent_axis,
            data,
        }
    }
}

/// Inbound request payload for `/query/` and `/fixed/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuery {
    /// Natural-language question
    pub query: String,
}

/// Message content as produced by the model: plain text or structured items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain answer text
    Text(String),
    /// Content items in the provider's own JSON shape
    Structured(serde_json::Value),
}

impl MessageContent {
    /// Best-effort plain text rendering, used for logging and terminal output
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Structured(value) => structured_text(value),
        }
    }

    /// Whether there is no answer text or payload
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.is_empty(),
            MessageContent::Structured(value) => value.is_null(),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

fn structured_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(structured_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        serde_json::Value::Object(map) => match map.get("text") {
            Some(text) => structured_text(text),
            None => value.to_string(),
        },
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Response body of `/query/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The model's final answer
    pub llm_responses: MessageContent,
    /// One chart per series from every range query of the turn
    pub charts_and_graphs: Vec<MetricChart>,
}

/// Time range for range queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: DateTime<Utc>,

    /// End time (inclusive)
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a time range for the last N minutes, or `None` when the window
    /// reaches past the representable calendar
    pub fn last_minutes(minutes: i64) -> Option<Self> {
        let end = Utc::now();
        let start = end.checked_sub_signed(chrono::Duration::try_minutes(minutes)?)?;
        Some(Self { start, end })
    }
}
