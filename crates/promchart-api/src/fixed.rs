//! Fixed sample chart for front-end work without live backends

use async_trait::async_trait;

use promchart_common::{
    ChartAccumulator, ChartAxis, ChartDataPoint, MessageContent, MetricChart, Result,
};

use crate::agent::TurnRunner;

const FIXED_POINTS: [(&str, &str); 6] = [
    ("2016-06-03T01:00:00", "2.4"),
    ("2016-06-03T02:00:00", "3.1"),
    ("2016-06-03T03:00:00", "5.7"),
    ("2016-06-04T01:00:00", "2.1"),
    ("2016-06-04T05:00:00", "2.6"),
    ("2016-06-04T06:00:00", "3.3"),
];

/// The "Pod CPU Usage" chart served by `/fixed/`
pub fn fixed_chart() -> MetricChart {
    MetricChart::line(
        "Pod CPU Usage",
        ChartAxis::new("Time", "date"),
        ChartAxis::new("CPU Usage", "cores"),
        FIXED_POINTS
            .iter()
            .map(|(x, y)| ChartDataPoint::new(*x, *y))
            .collect(),
    )
}

/// Turn runner for stub mode: no model, no Prometheus, always the fixed chart
#[derive(Debug, Default)]
pub struct StubRunner;

#[async_trait]
impl TurnRunner for StubRunner {
    async fn run_turn(&self, _query: &str, charts: &mut ChartAccumulator) -> Result<MessageContent> {
        charts.push(fixed_chart());
        Ok(MessageContent::Text(
            "Stub mode is enabled; showing sample chart data.".to_string(),
        ))
    }
}
