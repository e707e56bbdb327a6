//! Llama Stack client
//!
//! Covers the parts of the Llama Stack HTTP API the service needs: model and
//! shield discovery at startup, and non-streaming chat completion with client
//! tools during a turn.
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /v1/health` | liveness |
//! | `GET /v1/models` | model discovery |
//! | `GET /v1/shields` | safety shield discovery |
//! | `POST /v1/inference/chat-completion` | one model call |

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::LlamaStackConfig,
    error::{Error, Result},
    types::MessageContent,
};

// =============================================================================
// MESSAGES
// =============================================================================

/// A conversation message, tagged by role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Agent instructions, sent first
    System { content: MessageContent },
    /// The user's query
    User { content: MessageContent },
    /// A model reply, possibly requesting tool calls
    Assistant(CompletionMessage),
    /// The output of one tool call, matched by `call_id`
    Tool { call_id: String, content: MessageContent },
}

impl Message {
    /// System message with text content
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: MessageContent::Text(content.into()),
        }
    }

    /// User message with text content
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: MessageContent::Text(content.into()),
        }
    }

    /// Answer to the tool call identified by `call_id`
    pub fn tool_response(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            call_id: call_id.into(),
            content: MessageContent::Text(content.into()),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndOfTurn,
    EndOfMessage,
    OutOfTokens,
    #[serde(other)]
    Unknown,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    /// JSON object, or the same object encoded as text
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Arguments as a JSON object. Some providers send them as encoded text.
    pub fn parsed_arguments(&self) -> Result<Value> {
        match &self.arguments {
            Value::String(raw) if raw.trim().is_empty() => Ok(Value::Object(Default::default())),
            Value::String(raw) => Ok(serde_json::from_str(raw)?),
            Value::Null => Ok(Value::Object(Default::default())),
            other => Ok(other.clone()),
        }
    }
}

/// The assistant message returned by a chat completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    /// Answer text; often empty when tools are requested
    #[serde(default)]
    pub content: MessageContent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,

    /// Tool calls to run before the model is asked again
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

// =============================================================================
// TOOLS AND SAMPLING
// =============================================================================

/// One parameter of a client tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParamDefinition {
    /// Llama Stack type name such as `string` or `int`
    pub param_type: String,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// A client tool the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub tool_name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ToolParamDefinition>,
}

/// Tool selection policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
}

/// Tool settings sent with every completion request
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolConfig {
    pub tool_choice: ToolChoice,
}

/// Sampling strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SamplingStrategy {
    Greedy,
    TopP { temperature: f32, top_p: f32 },
}

/// Sampling settings for one completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub strategy: SamplingStrategy,
}

impl SamplingParams {
    /// Nucleus sampling with the given temperature
    pub fn top_p(temperature: f32, top_p: f32) -> Self {
        Self {
            strategy: SamplingStrategy::TopP { temperature, top_p },
        }
    }
}

/// Non-streaming chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model_id: String,
    pub messages: Vec<Message>,
    pub sampling_params: SamplingParams,
    /// Client tools offered to the model; omitted when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    pub tool_config: ToolConfig,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    completion_message: CompletionMessage,
}

/// Runs one model call
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send `request` and return the assistant message
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<CompletionMessage>;
}

// =============================================================================
// DISCOVERY
// =============================================================================

/// A registered model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub identifier: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
}

impl ModelInfo {
    /// Whether the model can serve chat completions
    pub fn is_llm(&self) -> bool {
        self.model_type.as_deref() == Some("llm")
    }
}

/// A registered safety shield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldInfo {
    pub identifier: String,
    #[serde(default)]
    pub provider_id: Option<String>,
}

/// List endpoints answer either with a bare array or a `data` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Enveloped { data: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Enveloped { data: items } => items,
        }
    }
}

/// Pick `preferred` when it is a listed model, else the first llm
pub fn choose_model(models: &[ModelInfo], preferred: Option<&str>) -> Result<String> {
    if let Some(preferred) = preferred {
        return models
            .iter()
            .find(|m| m.identifier == preferred)
            .map(|m| m.identifier.clone())
            .ok_or_else(|| Error::Config(format!("model {:?} is not registered", preferred)));
    }

    models
        .iter()
        .find(|m| m.is_llm())
        .map(|m| m.identifier.clone())
        .ok_or(Error::NoModelAvailable)
}

// =============================================================================
// CLIENT
// =============================================================================

/// Llama Stack HTTP client
#[derive(Clone)]
pub struct LlamaStackClient {
    client: Client,
    base_url: String,
}

impl LlamaStackClient {
    /// Create a new client from configuration
    pub fn new(config: &LlamaStackConfig) -> Result<Self> {
        Self::with_base_url(config.base_url())
    }

    /// Create a client for a server root such as `http://localhost:8321`
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::ModelConnection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| Error::ModelConnection(e.to_string()))?;

        decode(response).await
    }

    /// Check if the server is reachable
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .map_err(|e| Error::ModelConnection(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// List registered models
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let listing: Listing<ModelInfo> = self.get_json("/v1/models").await?;
        Ok(listing.into_vec())
    }

    /// List registered safety shields
    #[instrument(skip(self))]
    pub async fn list_shields(&self) -> Result<Vec<ShieldInfo>> {
        let listing: Listing<ShieldInfo> = self.get_json("/v1/shields").await?;
        Ok(listing.into_vec())
    }

    /// Resolve the model used for every turn
    pub async fn select_model(&self, preferred: Option<&str>) -> Result<String> {
        let models = self.list_models().await?;
        choose_model(&models, preferred)
    }
}

#[async_trait]
impl InferenceBackend for LlamaStackClient {
    #[instrument(skip(self, request), fields(model = %request.model_id, messages = request.messages.len()))]
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<CompletionMessage> {
        let response = self
            .client
            .post(format!("{}/v1/inference/chat-completion", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::ModelConnection(e.to_string()))?;

        let completion: ChatCompletionResponse = decode(response).await?;
        debug!(
            tool_calls = completion.completion_message.tool_calls.len(),
            "Chat completion received"
        );
        Ok(completion.completion_message)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::ModelConnection(e.to_string()))?;

    if !status.is_success() {
        return Err(Error::ModelResponse(format!("HTTP {}: {}", status, body.trim())));
    }

    serde_json::from_str(&body)
        .map_err(|e| Error::ModelResponse(format!("unexpected response body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(id: &str, model_type: &str) -> ModelInfo {
        ModelInfo {
            identifier: id.to_string(),
            provider_id: None,
            model_type: Some(model_type.to_string()),
        }
    }

    #[test]
    fn test_choose_first_llm() {
        let models = vec![
            model("all-MiniLM-L6-v2", "embedding"),
            model("llama3.2:3b", "llm"),
            model("llama3.1:8b", "llm"),
        ];
        assert_eq!(choose_model(&models, None).unwrap(), "llama3.2:3b");
    }

    #[test]
    fn test_choose_preferred() {
        let models = vec![model("a", "llm"), model("b", "llm")];
        assert_eq!(choose_model(&models, Some("b")).unwrap(), "b");
        assert!(matches!(
            choose_model(&models, Some("c")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_choose_without_llm() {
        let models = vec![model("embed", "embedding")];
        assert!(matches!(
            choose_model(&models, None),
            Err(Error::NoModelAvailable)
        ));
        assert!(matches!(choose_model(&[], None), Err(Error::NoModelAvailable)));
    }

    #[test]
    fn test_listing_shapes() {
        let bare: Listing<ShieldInfo> =
            serde_json::from_value(json!([{"identifier": "llama-guard"}])).unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let enveloped: Listing<ShieldInfo> =
            serde_json::from_value(json!({"data": []})).unwrap();
        assert!(enveloped.into_vec().is_empty());
    }

    #[test]
    fn test_message_serialization() {
        assert_eq!(
            serde_json::to_value(Message::user("cpu?")).unwrap(),
            json!({"role": "user", "content": "cpu?"})
        );
        assert_eq!(
            serde_json::to_value(Message::tool_response("c1", "[]")).unwrap(),
            json!({"role": "tool", "call_id": "c1", "content": "[]"})
        );

        let assistant = Message::Assistant(CompletionMessage {
            content: MessageContent::default(),
            stop_reason: Some(StopReason::EndOfMessage),
            tool_calls: vec![ToolCall {
                call_id: "c1".to_string(),
                tool_name: "prometheus_query".to_string(),
                arguments: json!({"query": "up"}),
            }],
        });
        let value = serde_json::to_value(&assistant).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["stop_reason"], "end_of_message");
        assert_eq!(value["tool_calls"][0]["tool_name"], "prometheus_query");
    }

    #[test]
    fn test_completion_message_parsing() {
        let message: CompletionMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "",
            "stop_reason": "end_of_turn",
            "tool_calls": [{"call_id": "x", "tool_name": "get_prometheus_metrics", "arguments": {}}]
        }))
        .unwrap();
        assert_eq!(message.stop_reason, Some(StopReason::EndOfTurn));
        assert_eq!(message.tool_calls.len(), 1);

        let odd: CompletionMessage =
            serde_json::from_value(json!({"content": "hi", "stop_reason": "max_tokens"})).unwrap();
        assert_eq!(odd.stop_reason, Some(StopReason::Unknown));
        assert!(odd.tool_calls.is_empty());
    }

    #[test]
    fn test_tool_call_parsed_arguments() {
        let mut call = ToolCall {
            call_id: "1".to_string(),
            tool_name: "prometheus_range_query".to_string(),
            arguments: json!(r#"{"query": "up", "minutes_ago": 10}"#),
        };
        assert_eq!(call.parsed_arguments().unwrap()["minutes_ago"], 10);

        call.arguments = Value::Null;
        assert_eq!(call.parsed_arguments().unwrap(), json!({}));

        call.arguments = json!("{broken");
        assert!(call.parsed_arguments().is_err());
    }

    #[test]
    fn test_sampling_params_format() {
        let params = SamplingParams::top_p(1.0, 0.9);
        let value = serde_json::to_value(params).unwrap();
        assert_eq!(value["strategy"]["type"], "top_p");
        assert_eq!(value["strategy"]["temperature"], 1.0);
    }
}
