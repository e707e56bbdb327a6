//! Configuration for promchart services

use serde::{Deserialize, Serialize};

use crate::types::ChartAxis;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Prometheus configuration
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Llama Stack configuration
    #[serde(default)]
    pub llama: LlamaStackConfig,

    /// Agent behaviour
    #[serde(default)]
    pub agent: AgentConfig,

    /// Chart axis metadata
    #[serde(default)]
    pub charts: ChartsConfig,

    /// API server configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Prometheus connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Prometheus base URL (e.g., "https://prometheus.example:9091")
    #[serde(default = "default_prometheus_url")]
    pub url: String,

    /// Bearer token (optional)
    #[serde(default = "default_prometheus_token")]
    pub token: Option<String>,

    /// Verify the server certificate
    #[serde(default)]
    pub verify_tls: bool,

    /// Range query resolution in seconds
    #[serde(default = "default_step_secs")]
    pub step_secs: u64,

    /// Range length used when the model does not pass one
    #[serde(default = "default_range_minutes")]
    pub default_range_minutes: i64,
}

fn default_prometheus_url() -> String {
    std::env::var("PROMETHEUS_URL").unwrap_or_default()
}

fn default_prometheus_token() -> Option<String> {
    std::env::var("PROMETHEUS_TOKEN").ok()
}

fn default_step_secs() -> u64 {
    15
}

fn default_range_minutes() -> i64 {
    5
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            url: default_prometheus_url(),
            token: default_prometheus_token(),
            verify_tls: false,
            step_secs: default_step_secs(),
            default_range_minutes: default_range_minutes(),
        }
    }
}

/// Llama Stack connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlamaStackConfig {
    /// Host name of the Llama Stack server
    #[serde(default = "default_llama_host")]
    pub host: String,

    /// Port of the Llama Stack server
    #[serde(default = "default_llama_port")]
    pub port: u16,

    /// Model identifier; the first available llm is used when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Raw `LLAMA_PORT` value when it is set but not a valid port
    #[serde(skip, default = "invalid_llama_port")]
    pub invalid_port_env: Option<String>,
}

fn default_llama_host() -> String {
    std::env::var("LLAMA_HOST").unwrap_or_default()
}

fn invalid_llama_port() -> Option<String> {
    std::env::var("LLAMA_PORT")
        .ok()
        .filter(|p| p.parse::<u16>().is_err())
}

fn default_llama_port() -> u16 {
    std::env::var("LLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8321)
}

impl Default for LlamaStackConfig {
    fn default() -> Self {
        Self {
            host: default_llama_host(),
            port: default_llama_port(),
            model: None,
            invalid_port_env: invalid_llama_port(),
        }
    }
}

impl LlamaStackConfig {
    /// Server root, e.g. `http://localhost:8321`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// System instructions sent with every turn
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-p sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Maximum model calls in one turn
    #[serde(default = "default_max_infer_iters")]
    pub max_infer_iters: u32,
}

fn default_instructions() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_temperature() -> f32 {
    1.0
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_infer_iters() -> u32 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_infer_iters: default_max_infer_iters(),
        }
    }
}

/// Axis metadata stamped on every assembled chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Time axis
    #[serde(default = "default_cross_axis")]
    pub cross_axis: ChartAxis,

    /// Value axis
    #[serde(default = "default_dependent_axis")]
    pub dependent_axis: ChartAxis,
}

fn default_cross_axis() -> ChartAxis {
    ChartAxis::new("Time", "date")
}

fn default_dependent_axis() -> ChartAxis {
    ChartAxis::new("Value", "number")
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            cross_axis: default_cross_axis(),
            dependent_axis: default_dependent_axis(),
        }
    }
}

/// Where `/query/` chart data comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    /// Model turn backed by Prometheus
    #[default]
    Live,
    /// Fixed sample chart, no backends
    Stub,
}

impl std::fmt::Display for ChartMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartMode::Live => write!(f, "live"),
            ChartMode::Stub => write!(f, "stub"),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Request timeout in seconds; unset means no timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Chart data mode
    #[serde(default)]
    pub mode: ChartMode,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_api_port(),
            timeout_secs: None,
            mode: ChartMode::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, crate::Error> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name("config.local").required(false))
            .add_source(config::Environment::with_prefix("PROMCHART").separator("__"))
            .build()
            .map_err(|e| crate::Error::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load configuration with defaults (for when config file doesn't exist)
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Check that the backends needed by the configured mode are set
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let Some(port) = &self.llama.invalid_port_env {
            return Err(crate::Error::Config(format!(
                "LLAMA_PORT {:?} is invalid: expected a port number",
                port
            )));
        }

        if self.api.mode == ChartMode::Stub {
            return Ok(());
        }

        if self.prometheus.url.trim().is_empty() {
            return Err(crate::Error::Config(
                "prometheus.url is not set (PROMETHEUS_URL)".to_string(),
            ));
        }
        reqwest::Url::parse(&self.prometheus.url).map_err(|e| {
            crate::Error::Config(format!(
                "prometheus.url {:?} is invalid: {}",
                self.prometheus.url, e
            ))
        })?;

        if self.llama.host.trim().is_empty() {
            return Err(crate::Error::Config(
                "llama.host is not set (LLAMA_HOST)".to_string(),
            ));
        }

        if self.prometheus.step_secs == 0 {
            return Err(crate::Error::Config(
                "prometheus.step_secs must be positive".to_string(),
            ));
        }

        if self.agent.max_infer_iters == 0 {
            return Err(crate::Error::Config(
                "agent.max_infer_iters must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
