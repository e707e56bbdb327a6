//! Ask and fixed-chart commands

use std::fmt::Write;

use promchart_common::{MetricChart, QueryResponse, UserQuery};

use super::read_json;
use crate::OutputFormat;

pub async fn handle(api_url: &str, query: &str, format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/query/", api_url))
        .json(&UserQuery {
            query: query.to_string(),
        })
        .send()
        .await?;
    let body = read_json(resp).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            let response: QueryResponse = serde_json::from_value(body)?;
            println!("{}\n", response.llm_responses.to_text());

            if response.charts_and_graphs.is_empty() {
                println!("(no charts)");
            }
            for chart in &response.charts_and_graphs {
                print!("{}", render_chart(chart, format));
            }
        }
    }

    Ok(())
}

pub async fn handle_fixed(api_url: &str, format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/fixed/", api_url))
        .json(&UserQuery {
            query: String::new(),
        })
        .send()
        .await?;
    let body = read_json(resp).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            let chart: MetricChart = serde_json::from_value(body)?;
            print!("{}", render_chart(&chart, format));
        }
    }

    Ok(())
}

/// Text rendering of one chart; compact prints bare `x y` lines
fn render_chart(chart: &MetricChart, format: OutputFormat) -> String {
    let mut out = String::new();

    match format {
        OutputFormat::Compact => {
            for point in &chart.data {
                let _ = writeln!(out, "{} {}", point.x, point.y);
            }
        }
        _ => {
            let x_header = axis_header(&chart.cross_axis.label, &chart.cross_axis.unit_or_type);
            let y_header = axis_header(
                &chart.dependent_axis.label,
                &chart.dependent_axis.unit_or_type,
            );

            let _ = writeln!(out, "{} ({} chart)", chart.title, chart.chart_type);
            let _ = writeln!(out, "{:<25} {:>15}", x_header, y_header);
            let _ = writeln!(out, "{}", "-".repeat(41));
            for point in &chart.data {
                let _ = writeln!(out, "{:<25} {:>15}", point.x, point.y);
            }
            out.push('\n');
        }
    }

    out
}

fn axis_header(label: &str, unit: &str) -> String {
    if unit.is_empty() {
        label.to_uppercase()
    } else {
        format!("{} [{}]", label.to_uppercase(), unit)
    }
}
