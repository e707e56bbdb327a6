//! HTTP surface

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use promchart_common::{
    config::{ApiConfig, ChartMode},
    llama_stack::ToolDefinition,
    prometheus::MetricsBackend,
    ChartAccumulator, Error, QueryResponse, UserQuery,
};

use crate::{agent::TurnRunner, fixed, tools::ToolRegistry};

/// Application state shared across handlers
pub struct AppState {
    pub runner: Arc<dyn TurnRunner>,
    /// Present in live mode, for health reporting
    pub metrics: Option<Arc<dyn MetricsBackend>>,
    pub tools: ToolRegistry,
    pub mode: ChartMode,
}

/// Build the router with its middleware stack
pub fn router(state: Arc<AppState>, config: &ApiConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/tools", get(list_tools_handler))
        .route("/query/", post(query_handler))
        .route("/fixed/", post(fixed_handler));

    if let Some(secs) = config.timeout_secs {
        app = app.layer(TimeoutLayer::new(Duration::from_secs(secs)));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "promchart API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ============================================================================
// Errors
// ============================================================================

/// Maps a turn failure to a status code and `{"error": ...}` body
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_connection_error() {
            StatusCode::BAD_GATEWAY
        } else if matches!(self.0, Error::InvalidParameter(_)) {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let healthy = match &state.metrics {
        Some(metrics) => matches!(metrics.health_check().await, Ok(true)),
        None => true,
    };

    let (status, label) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };
    (status, Json(HealthResponse { status: label, mode: state.mode }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    mode: ChartMode,
}

/// List the tools the agent exposes to the model
async fn list_tools_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tools: Vec<&ToolDefinition> = state.tools.list();
    Json(serde_json::json!({
        "tools": tools
    }))
}

/// Run one agent turn and return its text plus the charts its tools produced
async fn query_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UserQuery>,
) -> Result<Json<QueryResponse>, ApiError> {
    info!(query = %request.query, "User query");

    // Charts are scoped to this request only
    let mut charts = ChartAccumulator::new();

    match state.runner.run_turn(&request.query, &mut charts).await {
        Ok(llm_responses) => Ok(Json(QueryResponse {
            llm_responses,
            charts_and_graphs: charts.into_charts(),
        })),
        Err(e) => {
            error!(query = %request.query, error = %e, "Turn failed");
            Err(e.into())
        }
    }
}

/// Fixed sample chart; the query is validated but ignored
async fn fixed_handler(Json(_request): Json<UserQuery>) -> impl IntoResponse {
    Json(fixed::fixed_chart())
}
