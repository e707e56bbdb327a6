//! Error types for promchart

use thiserror::Error;

/// Result type alias using promchart Error
pub type Result<T> = std::result::Result<T, Error>;

/// promchart error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Prometheus connection error: {0}")]
    PrometheusConnection(String),

    #[error("Prometheus query error: {0}")]
    PrometheusQuery(String),

    #[error("Model service connection error: {0}")]
    ModelConnection(String),

    #[error("Model service error: {0}")]
    ModelResponse(String),

    #[error("No available models of type llm")]
    NoModelAvailable,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid query parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Error::PrometheusConnection(_) | Error::ModelConnection(_)
        )
    }
}
