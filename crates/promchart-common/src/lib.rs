//! promchart Common Library
//!
//! Shared types, chart assembly, and the Prometheus and Llama Stack clients
//! used by the promchart API server and CLI.

pub mod charts;
pub mod config;
pub mod error;
pub mod llama_stack;
pub mod prometheus;
pub mod types;

#[cfg(test)]
mod error_test;
#[cfg(test)]
mod types_test;

pub use charts::{ChartAccumulator, ChartAssembler};
pub use config::Config;
pub use error::{Error, Result};
pub use types::{ChartAxis, ChartDataPoint, MessageContent, MetricChart, QueryResponse, UserQuery};
