//! promchart API Server
//!
//! Answers natural-language questions about metrics. Each `/query/` request
//! runs one Llama Stack agent turn with Prometheus tools and returns the
//! model's answer together with the charts its range queries produced.

mod agent;
mod fixed;
mod server;
mod tools;

#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};

use tracing::{error, info, warn};

use promchart_common::{
    config::ChartMode,
    llama_stack::LlamaStackClient,
    prometheus::{MetricsBackend, PrometheusClient},
    Config,
};

use agent::Agent;
use fixed::StubRunner;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("promchart_api=debug".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .json()
        .init();

    info!("Starting promchart API server");

    // Load configuration; a broken configuration never serves traffic
    let config = Config::load()?;
    config.validate()?;
    info!(
        mode = %config.api.mode,
        prometheus_url = %config.prometheus.url,
        llama_url = %config.llama.base_url(),
        api_port = config.api.port,
        "Configuration loaded"
    );

    let state = match config.api.mode {
        ChartMode::Live => live_state(&config).await?,
        ChartMode::Stub => {
            warn!("Stub mode: /query/ returns the fixed sample chart");
            AppState {
                runner: Arc::new(StubRunner),
                metrics: None,
                tools: tools::create_tool_registry(config.prometheus.default_range_minutes),
                mode: ChartMode::Stub,
            }
        }
    };

    let app = server::router(Arc::new(state), &config.api);

    let addr = SocketAddr::new(
        config.api.host.parse().unwrap_or([0, 0, 0, 0].into()),
        config.api.port,
    );
    server::serve(app, addr).await?;

    info!("promchart API server stopped");
    Ok(())
}

/// Connect the metrics and model clients and build the agent
async fn live_state(config: &Config) -> anyhow::Result<AppState> {
    let prometheus = PrometheusClient::new(&config.prometheus)?;

    match prometheus.health_check().await {
        Ok(true) => info!("Prometheus connection established"),
        Ok(false) => error!("Prometheus health check returned false"),
        Err(e) => error!(error = %e, "Prometheus connection failed - continuing anyway"),
    }

    let llama = LlamaStackClient::new(&config.llama)?;

    // Shields are discovered for visibility only; safety is not applied
    match llama.list_shields().await {
        Ok(shields) if shields.is_empty() => warn!("No available shields. Disabling safety."),
        Ok(shields) => {
            let ids: Vec<_> = shields.iter().map(|s| s.identifier.as_str()).collect();
            info!(shields = ?ids, "Available shields found");
        }
        Err(e) => warn!(error = %e, "Could not list shields. Disabling safety."),
    }

    let model = llama.select_model(config.llama.model.as_deref()).await?;

    let metrics: Arc<dyn MetricsBackend> = Arc::new(prometheus);
    let agent = Agent::new(Arc::new(llama), metrics.clone(), model, config);
    info!(model = %agent.model(), "Using model");
    let tools = agent.tools().clone();

    Ok(AppState {
        runner: Arc::new(agent),
        metrics: Some(metrics),
        tools,
        mode: ChartMode::Live,
    })
}
