//! Prometheus HTTP API client for promchart

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::PrometheusConfig,
    error::{Error, Result},
    types::TimeRange,
};

/// Queries a time-series backend on behalf of the agent's tools
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Names of every queryable metric
    async fn all_metrics(&self) -> Result<Vec<String>>;

    /// Instantaneous query; returns the raw `result` value
    async fn query(&self, query: &str) -> Result<Value>;

    /// Range query; returns the raw `result` value
    async fn query_range(&self, query: &str, range: &TimeRange, step_secs: u64) -> Result<Value>;
}

/// Prometheus client with optional bearer authentication
#[derive(Clone)]
pub struct PrometheusClient {
    client: Client,
    base_url: Url,
}

impl PrometheusClient {
    /// Create a new Prometheus client from configuration
    pub fn new(config: &PrometheusConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("invalid Prometheus URL {:?}: {}", config.url, e)))?;

        // Keep any path prefix when joining API paths
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = config.token {
            let value = header::HeaderValue::from_str(&format!("bearer {}", token))
                .map_err(|e| Error::Config(format!("invalid Prometheus token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::PrometheusConnection(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Internal(format!("bad endpoint {}: {}", path, e)))
    }

    async fn get_data(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .query(params)
            .send()
            .await
            .map_err(|e| Error::PrometheusConnection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::PrometheusConnection(e.to_string()))?;

        parse_api_response(status.as_u16(), &body)
    }
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("-/healthy")?)
            .send()
            .await
            .map_err(|e| Error::PrometheusConnection(e.to_string()))?;

        Ok(response.status().is_success())
    }

    #[instrument(skip(self))]
    async fn all_metrics(&self) -> Result<Vec<String>> {
        let data = self.get_data("api/v1/label/__name__/values", &[]).await?;
        let names: Vec<String> = serde_json::from_value(data)?;

        debug!(count = names.len(), "Listed metric names");
        Ok(names)
    }

    #[instrument(skip(self))]
    async fn query(&self, query: &str) -> Result<Value> {
        let data = self
            .get_data("api/v1/query", &[("query", query.to_string())])
            .await?;

        Ok(result_of(data))
    }

    #[instrument(skip(self, range))]
    async fn query_range(&self, query: &str, range: &TimeRange, step_secs: u64) -> Result<Value> {
        let params = [
            ("query", query.to_string()),
            ("start", range.start.timestamp().to_string()),
            ("end", range.end.timestamp().to_string()),
            ("step", step_secs.to_string()),
        ];
        let data = self.get_data("api/v1/query_range", &params).await?;

        Ok(result_of(data))
    }
}

/// Prometheus API envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Unwrap an API envelope into its `data` member
pub(crate) fn parse_api_response(status: u16, body: &str) -> Result<Value> {
    let Ok(envelope) = serde_json::from_str::<ApiResponse>(body) else {
        return Err(Error::PrometheusQuery(format!(
            "HTTP {}: {}",
            status,
            body.trim()
        )));
    };

    if envelope.status != "success" {
        return Err(Error::PrometheusQuery(format!(
            "{}: {}",
            envelope.error_type.as_deref().unwrap_or("error"),
            envelope.error.as_deref().unwrap_or("unknown error")
        )));
    }

    Ok(envelope.data)
}

/// The `result` member of a query `data` object
fn result_of(mut data: Value) -> Value {
    data.get_mut("result").map(Value::take).unwrap_or(Value::Null)
}
