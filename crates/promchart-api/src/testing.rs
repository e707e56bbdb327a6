//! In-memory backends for tests

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};

use promchart_common::{
    llama_stack::{ChatCompletionRequest, CompletionMessage, InferenceBackend, StopReason, ToolCall},
    prometheus::MetricsBackend,
    types::TimeRange,
    Error, MessageContent, Result,
};

/// Metrics backend answering every query with one canned result
pub struct FakeMetrics {
    result: Option<Value>,
    queries: Mutex<Vec<String>>,
}

impl FakeMetrics {
    pub fn new(result: Value) -> Self {
        Self {
            result: Some(result),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if Prometheus were down
    pub fn failing() -> Self {
        Self {
            result: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn answer(&self, record: String) -> Result<Value> {
        let result = self
            .result
            .clone()
            .ok_or_else(|| Error::PrometheusConnection("connection refused".to_string()))?;
        self.queries.lock().unwrap().push(record);
        Ok(result)
    }
}

#[async_trait]
impl MetricsBackend for FakeMetrics {
    async fn health_check(&self) -> Result<bool> {
        Ok(self.result.is_some())
    }

    async fn all_metrics(&self) -> Result<Vec<String>> {
        self.answer("all_metrics".to_string())?;
        Ok(vec!["node_cpu_seconds_total".to_string(), "up".to_string()])
    }

    async fn query(&self, query: &str) -> Result<Value> {
        self.answer(format!("query:{}", query))
    }

    async fn query_range(&self, query: &str, range: &TimeRange, step_secs: u64) -> Result<Value> {
        let minutes = (range.end - range.start).num_minutes();
        self.answer(format!("range:{}:{}m:{}s", query, minutes, step_secs))
    }
}

/// Inference backend replaying scripted replies and recording requests
#[derive(Clone, Default)]
pub struct ScriptedInference {
    replies: Arc<Mutex<VecDeque<Result<CompletionMessage>>>>,
    requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_text(self, text: &str) -> Self {
        self.push(Ok(CompletionMessage {
            content: MessageContent::Text(text.to_string()),
            stop_reason: Some(StopReason::EndOfTurn),
            tool_calls: Vec::new(),
        }))
    }

    pub fn reply_tool_call(self, call_id: &str, tool_name: &str, arguments: Value) -> Self {
        self.push(Ok(CompletionMessage {
            content: MessageContent::default(),
            stop_reason: Some(StopReason::EndOfMessage),
            tool_calls: vec![ToolCall {
                call_id: call_id.to_string(),
                tool_name: tool_name.to_string(),
                arguments,
            }],
        }))
    }

    pub fn reply_error(self, message: &str) -> Self {
        self.push(Err(Error::ModelResponse(message.to_string())))
    }

    fn push(self, reply: Result<CompletionMessage>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedInference {
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<CompletionMessage> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Internal("no scripted reply left".to_string())))
    }
}

/// A two-series, three-sample range result
pub fn sample_matrix() -> Value {
    json!([
        {"metric": {"pod": "web-0"}, "values": [[1718000000, "0.1"], [1718000015, "0.2"], [1718000030, "0.3"]]},
        {"metric": {"pod": "web-1"}, "values": [[1718000000, "1.1"], [1718000015, "1.2"], [1718000030, "1.3"]]}
    ])
}
