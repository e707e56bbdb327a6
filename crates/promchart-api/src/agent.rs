//! Agent turn runner
//!
//! One request runs one turn in a fresh, in-memory session. The model is
//! called with the tool definitions; every tool call it asks for is executed
//! here and answered before the model is called again.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use promchart_common::{
    config::AgentConfig,
    llama_stack::{
        ChatCompletionRequest, InferenceBackend, Message, SamplingParams, ToolCall, ToolConfig,
    },
    prometheus::MetricsBackend,
    ChartAccumulator, ChartAssembler, Config, Error, MessageContent, Result,
};

use crate::tools::{self, ToolContext, ToolRegistry};

/// Runs one model turn for a user query, filling `charts` along the way
#[async_trait]
pub trait TurnRunner: Send + Sync {
    async fn run_turn(&self, query: &str, charts: &mut ChartAccumulator) -> Result<MessageContent>;
}

/// A conversation that lives for one request and is never persisted
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    messages: Vec<Message>,
}

impl Session {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Model-backed agent with Prometheus tools
pub struct Agent {
    inference: Arc<dyn InferenceBackend>,
    metrics: Arc<dyn MetricsBackend>,
    tools: ToolRegistry,
    assembler: ChartAssembler,
    model: String,
    settings: AgentConfig,
    step_secs: u64,
    default_range_minutes: i64,
}

impl Agent {
    pub fn new(
        inference: Arc<dyn InferenceBackend>,
        metrics: Arc<dyn MetricsBackend>,
        model: impl Into<String>,
        config: &Config,
    ) -> Self {
        Self {
            inference,
            metrics,
            tools: tools::create_tool_registry(config.prometheus.default_range_minutes),
            assembler: ChartAssembler::from_config(&config.charts),
            model: model.into(),
            settings: config.agent.clone(),
            step_secs: config.prometheus.step_secs,
            default_range_minutes: config.prometheus.default_range_minutes,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn create_session(&self) -> Session {
        Session {
            id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    /// Submit `query` as the sole user message of one turn and wait for the
    /// model's final answer. Any model or tool failure aborts the turn.
    #[instrument(skip(self, session, charts), fields(session_id = %session.id, model = %self.model))]
    pub async fn create_turn(
        &self,
        session: &mut Session,
        query: &str,
        charts: &mut ChartAccumulator,
    ) -> Result<MessageContent> {
        session.messages.push(Message::user(query));

        let mut last_content = MessageContent::default();
        for iteration in 1..=self.settings.max_infer_iters {
            let reply = self.inference.chat_completion(&self.request(session)).await?;
            session.messages.push(Message::Assistant(reply.clone()));

            if reply.tool_calls.is_empty() {
                info!(
                    iteration,
                    messages = session.messages().len(),
                    charts = charts.len(),
                    "Turn completed"
                );
                return Ok(reply.content);
            }

            for call in &reply.tool_calls {
                let output = self.call_tool(call, charts).await?;
                session
                    .messages
                    .push(Message::tool_response(call.call_id.clone(), output));
            }
            last_content = reply.content;
        }

        warn!(
            max_infer_iters = self.settings.max_infer_iters,
            "Turn stopped at the inference limit"
        );
        Ok(last_content)
    }

    fn request(&self, session: &Session) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(session.messages.len() + 1);
        messages.push(Message::system(self.settings.instructions.clone()));
        messages.extend(session.messages.iter().cloned());

        ChatCompletionRequest {
            model_id: self.model.clone(),
            messages,
            sampling_params: SamplingParams::top_p(self.settings.temperature, self.settings.top_p),
            tools: self.tools.definitions(),
            tool_config: ToolConfig::default(),
            stream: false,
        }
    }

    async fn call_tool(&self, call: &ToolCall, charts: &mut ChartAccumulator) -> Result<String> {
        info!(tool = %call.tool_name, call_id = %call.call_id, "Tool invocation");

        // Only advertised tools may run
        if self.tools.get(&call.tool_name).is_none() {
            error!(tool = %call.tool_name, "Model requested an unknown tool");
            return Err(Error::NotFound(format!("Tool not found: {}", call.tool_name)));
        }

        let params = call.parsed_arguments()?;
        let mut ctx = ToolContext {
            metrics: self.metrics.as_ref(),
            assembler: &self.assembler,
            charts,
            step_secs: self.step_secs,
            default_range_minutes: self.default_range_minutes,
        };

        match tools::execute_tool(&mut ctx, &call.tool_name, params).await {
            Ok(output) => Ok(tools::tool_output_text(&output)),
            Err(e) => {
                error!(tool = %call.tool_name, error = %e, "Tool execution failed");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl TurnRunner for Agent {
    async fn run_turn(&self, query: &str, charts: &mut ChartAccumulator) -> Result<MessageContent> {
        let mut session = self.create_session();
        self.create_turn(&mut session, query, charts).await
    }
}
