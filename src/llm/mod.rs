//! LLM-backed work executor via rig-core.
//!
//! [`AgentExecutor`] wraps a rig Anthropic agent configured with the
//! finance-assistant preamble. [`agent_factory`] produces the closure a
//! [`LazyExecutor`](crate::executor::LazyExecutor) uses to build it on
//! first use.
//!
//! # Example
//! ```no_run
//! use porta_rs::llm::anthropic_client;
//! use porta_rs::config::secrets::SecretString;
//!
//! let key = SecretString::from("sk-ant-...");
//! let client = anthropic_client(&key).expect("failed to create Anthropic client");
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::{Chat, Message};
use rig::providers::anthropic;
use serde_json::Value;
use tracing::Instrument;

use crate::config::Config;
use crate::config::secrets::{ExposeSecret, SecretString};
use crate::error::{Error, Result};
use crate::executor::WorkExecutor;
use crate::model::{ChatTurn, Role};
use crate::telemetry::genai::{record_turns, start_chat_span};

pub const SYSTEM_PROMPT: &str = "\
You are Porta, a finance-focused assistant. Your job: help manage a user's portfolio and watchlist.

Rules:
- When operations fail, explain the error to the user clearly but simply.
- Never expose technical details, backend errors, or API connection issues to users.
- Always ask for all required information before acting:
  * For portfolio: ticker, quantity, buy_price, and optionally a note
  * For watchlist: ticker and optionally a note
- If the user gives incomplete instructions, ask clarifying questions for the missing details.
- Be concise and neutral. Provide insights, not investment advice.
- Always respect ticker format (uppercase letters/numbers/.-).";

const PROVIDER: &str = "anthropic";
const MAX_TOKENS: u64 = 4096;

type AnthropicAgent = Agent<<anthropic::Client as CompletionClient>::CompletionModel>;

/// Create an Anthropic client from a secret API key.
///
/// # Errors
/// Returns an error if the underlying HTTP client cannot be constructed.
pub fn anthropic_client(
    api_key: &SecretString,
) -> std::result::Result<anthropic::Client, rig::http_client::Error> {
    anthropic::Client::new(api_key.expose_secret())
}

/// Chat agent backed by an Anthropic model.
pub struct AgentExecutor {
    agent: AnthropicAgent,
    model: String,
}

impl AgentExecutor {
    /// Build the agent.
    ///
    /// # Errors
    /// [`Error::ExecutorUnavailable`] if no API key is configured or the
    /// client cannot be built.
    ///
    /// # Panics
    /// Must be called inside a Tokio runtime; rig spawns the agent's tool
    /// server task during the build.
    pub fn build(api_key: Option<&SecretString>, model: &str) -> Result<Self> {
        let api_key = api_key.ok_or_else(|| {
            Error::ExecutorUnavailable(
                "ANTHROPIC_API_KEY not set. Put it in your environment or a .env file.".to_string(),
            )
        })?;
        let client = anthropic_client(api_key)
            .map_err(|e| Error::ExecutorUnavailable(format!("anthropic client: {e}")))?;

        let agent = client
            .agent(model)
            .preamble(SYSTEM_PROMPT)
            .temperature(0.0)
            .max_tokens(MAX_TOKENS)
            .build();

        Ok(Self {
            agent,
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl WorkExecutor for AgentExecutor {
    async fn execute(&self, message: &str, history: &[ChatTurn]) -> Result<Value> {
        let span = start_chat_span(&self.model, PROVIDER);
        let history = to_rig_history(history);
        record_turns(&span, history.len());

        let reply = self
            .agent
            .chat(message, history)
            .instrument(span)
            .await
            .map_err(|e| Error::Executor(e.to_string()))?;

        Ok(Value::String(reply))
    }
}

fn to_rig_history(turns: &[ChatTurn]) -> Vec<Message> {
    turns
        .iter()
        .filter_map(|turn| match turn.role {
            Role::User => Some(Message::user(turn.content.clone())),
            Role::Assistant => Some(Message::assistant(turn.content.clone())),
            Role::Other => None,
        })
        .collect()
}

/// Factory for a lazily built [`AgentExecutor`]. Credentials and model are
/// captured from `config` now; the agent is built when the factory runs.
pub fn agent_factory(
    config: &Config,
) -> impl Fn() -> Result<Arc<dyn WorkExecutor>> + Send + Sync + 'static {
    let api_key = config
        .anthropic_api_key
        .as_ref()
        .map(|key| SecretString::from(key.expose_secret().to_owned()));
    let model = config.anthropic_model.clone();
    move || {
        let executor = AgentExecutor::build(api_key.as_ref(), &model)?;
        tracing::info!(model = %executor.model(), "AI agent initialized");
        Ok(Arc::new(executor) as Arc<dyn WorkExecutor>)
    }
}
