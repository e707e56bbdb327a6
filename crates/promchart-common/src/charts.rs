//! Chart assembly from Prometheus range results
//!
//! A range query returns a matrix: a list of series, each carrying its label
//! set under `metric` and its samples under `values` as `[timestamp, value]`
//! pairs. Every series becomes one line chart.

use serde_json::Value;
use tracing::debug;

use crate::{
    config::ChartsConfig,
    types::{ChartAxis, ChartDataPoint, MetricChart},
};

/// Builds charts from raw range query results
#[derive(Debug, Clone)]
pub struct ChartAssembler {
    cross_axis: ChartAxis,
    dependent_axis: ChartAxis,
}

impl ChartAssembler {
    /// Assembler with explicit axes
    pub fn new(cross_axis: ChartAxis, dependent_axis: ChartAxis) -> Self {
        Self {
            cross_axis,
            dependent_axis,
        }
    }

    /// Assembler with the configured axes
    pub fn from_config(config: &ChartsConfig) -> Self {
        Self::new(config.cross_axis.clone(), config.dependent_axis.clone())
    }

    /// Build one chart per series in `result`, titled with `query`.
    ///
    /// Anything other than a non-empty list yields no charts. A series
    /// without a `values` list yields a chart with no points.
    pub fn assemble(&self, query: &str, result: &Value) -> Vec<MetricChart> {
        let Some(series) = result.as_array() else {
            debug!(query, "Range result is not a series list, no charts");
            return Vec::new();
        };

        series
            .iter()
            .map(|s| {
                MetricChart::line(
                    query,
                    self.cross_axis.clone(),
                    self.dependent_axis.clone(),
                    data_points(s),
                )
            })
            .collect()
    }
}

impl Default for ChartAssembler {
    fn default() -> Self {
        Self::from_config(&ChartsConfig::default())
    }
}

/// Samples that are not `[x, y]` pairs are skipped and logged
fn data_points(series: &Value) -> Vec<ChartDataPoint> {
    let Some(samples) = series.get("values").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(samples.len());
    for (index, sample) in samples.iter().enumerate() {
        match sample.as_array().map(Vec::as_slice) {
            Some([x, y, ..]) => points.push(ChartDataPoint::new(verbatim(x), verbatim(y))),
            _ => debug!(index, sample = %sample, "Skipping malformed range sample"),
        }
    }
    points
}

/// Text form of a JSON scalar without quoting strings
fn verbatim(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Charts gathered while serving one request.
///
/// Created empty by the request handler, appended to by tool calls during the
/// model turn, and consumed into the response.
#[derive(Debug, Default)]
pub struct ChartAccumulator {
    charts: Vec<MetricChart>,
}

impl ChartAccumulator {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chart
    pub fn push(&mut self, chart: MetricChart) {
        self.charts.push(chart);
    }

    /// Append charts, keeping their order
    pub fn extend(&mut self, charts: impl IntoIterator<Item = MetricChart>) {
        self.charts.extend(charts);
    }

    /// Number of charts gathered so far
    pub fn len(&self) -> usize {
        self.charts.len()
    }

    /// Whether no chart has been gathered
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Charts gathered so far, in insertion order
    pub fn charts(&self) -> &[MetricChart] {
        &self.charts
    }

    /// Consume into the response list
    pub fn into_charts(self) -> Vec<MetricChart> {
        self.charts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matrix(series: usize, samples: usize) -> Value {
        let list: Vec<Value> = (0..series)
            .map(|s| {
                let values: Vec<Value> = (0..samples)
                    .map(|i| json!([1_718_000_000 + i * 15, format!("{}.{}", s, i)]))
                    .collect();
                json!({"metric": {"pod": format!("pod-{}", s)}, "values": values})
            })
            .collect();
        Value::Array(list)
    }

    #[test]
    fn test_one_chart_per_series() {
        let assembler = ChartAssembler::default();
        let charts = assembler.assemble("up", &matrix(3, 4));

        assert_eq!(charts.len(), 3);
        for (s, chart) in charts.iter().enumerate() {
            assert_eq!(chart.title, "up");
            assert_eq!(chart.data.len(), 4);
            for (i, point) in chart.data.iter().enumerate() {
                assert_eq!(point.x, (1_718_000_000 + i * 15).to_string());
                assert_eq!(point.y, format!("{}.{}", s, i));
            }
        }
    }

    #[test]
    fn test_coordinates_are_verbatim() {
        let result = json!([{"metric": {}, "values": [[1435781430.781, "1.000000001"], [1435781445, "NaN"]]}]);
        let charts = ChartAssembler::default().assemble("q", &result);

        assert_eq!(charts[0].data[0], ChartDataPoint::new("1435781430.781", "1.000000001"));
        assert_eq!(charts[0].data[1], ChartDataPoint::new("1435781445", "NaN"));
    }

    #[test]
    fn test_empty_and_non_list_results_yield_nothing() {
        let assembler = ChartAssembler::default();
        assert!(assembler.assemble("q", &json!([])).is_empty());
        assert!(assembler.assemble("q", &json!({"resultType": "scalar"})).is_empty());
        assert!(assembler.assemble("q", &Value::Null).is_empty());
        assert!(assembler.assemble("q", &json!("text")).is_empty());
    }

    #[test]
    fn test_series_without_values_has_no_points() {
        let result = json!([{"metric": {"job": "node"}, "value": [1718000000, "1"]}]);
        let charts = ChartAssembler::default().assemble("up", &result);
        assert_eq!(charts.len(), 1);
        assert!(charts[0].data.is_empty());
    }

    #[test]
    fn test_malformed_samples_are_skipped_in_order() {
        let result = json!([{
            "metric": {},
            "values": [[1718000000, "1"], "garbage", [1718000015], [1718000030, "3"]]
        }]);
        let charts = ChartAssembler::default().assemble("up", &result);

        assert_eq!(
            charts[0].data,
            vec![
                ChartDataPoint::new("1718000000", "1"),
                ChartDataPoint::new("1718000030", "3"),
            ]
        );
    }

    #[test]
    fn test_configured_axes_are_applied() {
        let assembler = ChartAssembler::new(
            ChartAxis::new("When", "timestamp"),
            ChartAxis::new("CPU Usage", "cores"),
        );
        let charts = assembler.assemble("q", &matrix(1, 1));
        assert_eq!(charts[0].cross_axis, ChartAxis::new("When", "timestamp"));
        assert_eq!(charts[0].dependent_axis, ChartAxis::new("CPU Usage", "cores"));
    }

    #[test]
    fn test_accumulator_appends_in_order() {
        let assembler = ChartAssembler::default();
        let mut acc = ChartAccumulator::new();
        assert!(acc.is_empty());

        acc.extend(assembler.assemble("a", &matrix(2, 1)));
        acc.push(MetricChart::line(
            "b",
            ChartAxis::new("x", "x"),
            ChartAxis::new("y", "y"),
            Vec::new(),
        ));

        assert_eq!(acc.len(), 3);
        let titles: Vec<_> = acc.into_charts().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["a", "a", "b"]);
    }
}
