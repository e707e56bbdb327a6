//! Client tools exposed to the model
//!
//! The model calls these during a turn to look at metrics. Only the range
//! query feeds the chart accumulator; the instantaneous query and the metric
//! catalog are text for the model alone.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use promchart_common::{
    llama_stack::{ToolDefinition, ToolParamDefinition},
    prometheus::MetricsBackend,
    types::TimeRange,
    ChartAccumulator, ChartAssembler, Error, Result,
};

pub const GET_PROMETHEUS_METRICS: &str = "get_prometheus_metrics";
pub const PROMETHEUS_QUERY: &str = "prometheus_query";
pub const PROMETHEUS_RANGE_QUERY: &str = "prometheus_range_query";

/// Registry of available tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: ToolDefinition) {
        self.tools.insert(tool.tool_name.clone(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Owned definitions, in name order, for a completion request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().cloned().collect()
    }
}

fn param(param_type: &str, description: &str, required: bool, default: Option<Value>) -> ToolParamDefinition {
    ToolParamDefinition {
        param_type: param_type.to_string(),
        description: description.to_string(),
        required,
        default,
    }
}

/// Create the tool registry the agent exposes
pub fn create_tool_registry(default_range_minutes: i64) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(ToolDefinition {
        tool_name: GET_PROMETHEUS_METRICS.to_string(),
        description: "Get the list of all of the prometheus metrics available".to_string(),
        parameters: BTreeMap::new(),
    });

    registry.register(ToolDefinition {
        tool_name: PROMETHEUS_QUERY.to_string(),
        description: "Execute a custom instantaneous prometheus query".to_string(),
        parameters: BTreeMap::from([(
            "query".to_string(),
            param("string", "the promql query to execute", true, None),
        )]),
    });

    registry.register(ToolDefinition {
        tool_name: PROMETHEUS_RANGE_QUERY.to_string(),
        description: "Perform a ranged Prometheus query using default step size.".to_string(),
        parameters: BTreeMap::from([
            (
                "query".to_string(),
                param("string", "PromQL expression.", true, None),
            ),
            (
                "minutes_ago".to_string(),
                param(
                    "int",
                    "How many minutes back to query from now.",
                    false,
                    Some(Value::from(default_range_minutes)),
                ),
            ),
        ]),
    });

    registry
}

/// Everything a tool call may touch during one turn
pub struct ToolContext<'a> {
    pub metrics: &'a dyn MetricsBackend,
    pub assembler: &'a ChartAssembler,
    pub charts: &'a mut ChartAccumulator,
    pub step_secs: u64,
    pub default_range_minutes: i64,
}

/// Execute a tool by name
pub async fn execute_tool(ctx: &mut ToolContext<'_>, tool_name: &str, params: Value) -> Result<Value> {
    match tool_name {
        GET_PROMETHEUS_METRICS => execute_get_prometheus_metrics(ctx).await,
        PROMETHEUS_QUERY => execute_prometheus_query(ctx, params).await,
        PROMETHEUS_RANGE_QUERY => execute_prometheus_range_query(ctx, params).await,
        _ => Err(Error::NotFound(format!("Tool not found: {}", tool_name))),
    }
}

/// Text handed back to the model for a tool result
pub fn tool_output_text(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(tool_name: &str, params: Value) -> Result<T> {
    serde_json::from_value(params)
        .map_err(|e| Error::InvalidParameter(format!("{}: {}", tool_name, e)))
}

// ============================================================================
// Tool implementations
// ============================================================================

async fn execute_get_prometheus_metrics(ctx: &ToolContext<'_>) -> Result<Value> {
    let names = ctx.metrics.all_metrics().await?;
    debug!(count = names.len(), "Metric catalog fetched");
    Ok(Value::from(names))
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    query: String,
}

async fn execute_prometheus_query(ctx: &ToolContext<'_>, params: Value) -> Result<Value> {
    let p: QueryParams = parse_params(PROMETHEUS_QUERY, params)?;

    info!(query = %p.query, "prometheus_query");

    ctx.metrics.query(&p.query).await
}

#[derive(Debug, Deserialize)]
struct RangeQueryParams {
    query: String,
    #[serde(default)]
    minutes_ago: Option<Value>,
}

async fn execute_prometheus_range_query(ctx: &mut ToolContext<'_>, params: Value) -> Result<Value> {
    let p: RangeQueryParams = parse_params(PROMETHEUS_RANGE_QUERY, params)?;
    let minutes = minutes_ago(p.minutes_ago.as_ref(), ctx.default_range_minutes)?;
    let range = TimeRange::last_minutes(minutes).ok_or_else(|| {
        Error::InvalidParameter(format!("minutes_ago is out of range, got {}", minutes))
    })?;

    info!(query = %p.query, minutes_ago = minutes, "prometheus range query");

    let result = ctx
        .metrics
        .query_range(&p.query, &range, ctx.step_secs)
        .await?;

    let charts = ctx.assembler.assemble(&p.query, &result);
    debug!(charts = charts.len(), "Charts assembled from range result");
    ctx.charts.extend(charts);

    Ok(result)
}

/// Models pass integers, floats, or numeric strings; all must be positive
fn minutes_ago(value: Option<&Value>, default: i64) -> Result<i64> {
    let minutes = match value {
        None | Some(Value::Null) => default,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            Error::InvalidParameter(format!("minutes_ago must be an integer, got {:?}", s))
        })?,
        Some(other) => {
            return Err(Error::InvalidParameter(format!(
                "minutes_ago must be an integer, got {}",
                other
            )))
        }
    };

    if minutes <= 0 {
        return Err(Error::InvalidParameter(format!(
            "minutes_ago must be positive, got {}",
            minutes
        )));
    }

    Ok(minutes)
}
