//! Agentic turn runner for the secretary

use std::sync::Arc;

use async_trait::async_trait;

use super::openai::{ChatClient, ChatMessage, ChatRequest};
use crate::db::{SessionStore, StoredRole};
use crate::tools::SecretaryTools;
use crate::{Error, Result};

/// How many stored turns the agent sees per run
const HISTORY_LIMIT: usize = 50;

/// Port for agent execution, injectable for tests
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Produce one assistant reply for a new user message
    async fn run(&self, user_text: &str) -> Result<String>;
}

/// Static configuration for the secretary agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Session key for history reads and writes
    pub session_key: String,
    /// System prompt (persona)
    pub instructions: String,
    /// Chat model identifier
    pub model: String,
    /// Max tokens per completion
    pub max_tokens: u32,
    /// Max tool-call rounds per turn
    pub max_iterations: u32,
}

/// The secretary agent: persona, tool set, session history, tool-call loop
pub struct SecretaryAgent {
    chat: ChatClient,
    tools: SecretaryTools,
    sessions: Arc<dyn SessionStore>,
    config: AgentConfig,
}

impl SecretaryAgent {
    /// Create the agent
    #[must_use]
    pub fn new(
        chat: ChatClient,
        tools: SecretaryTools,
        sessions: Arc<dyn SessionStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            chat,
            tools,
            sessions,
            config,
        }
    }
}

/// Assemble `[system, ...history, user]` for one run
fn build_messages(
    instructions: &str,
    history: &[crate::db::StoredMessage],
    user_text: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(instructions));
    for stored in history {
        messages.push(match stored.role {
            StoredRole::User => ChatMessage::user(&stored.content),
            StoredRole::Assistant => ChatMessage::assistant(&stored.content),
        });
    }
    messages.push(ChatMessage::user(user_text));
    messages
}

#[async_trait]
impl AgentRunner for SecretaryAgent {
    async fn run(&self, user_text: &str) -> Result<String> {
        let history = self
            .sessions
            .history(&self.config.session_key, HISTORY_LIMIT)?;
        let mut messages = build_messages(&self.config.instructions, &history, user_text);

        let tools = SecretaryTools::tool_definitions();
        let max_iter = self.config.max_iterations.min(20);
        let mut reply = String::new();

        for _round in 0..max_iter {
            let request = ChatRequest {
                model: self.config.model.clone(),
                messages: messages.clone(),
                tools: Some(tools.clone()),
                max_tokens: Some(self.config.max_tokens),
            };

            let completion = self.chat.complete(&request).await?;
            let tool_calls = completion.message.tool_calls.clone().unwrap_or_default();

            if completion.finish_reason.as_deref() == Some("tool_calls") && !tool_calls.is_empty()
            {
                messages.push(completion.message);

                for call in &tool_calls {
                    tracing::debug!(tool = %call.function.name, "executing tool call");
                    let output = match self
                        .tools
                        .execute(&call.function.name, &call.function.arguments)
                    {
                        Ok(out) => out,
                        Err(e) => format!("Error: {e}"),
                    };
                    messages.push(ChatMessage::tool(&call.id, &output));
                }

                continue;
            }

            reply = completion
                .message
                .content
                .unwrap_or_default()
                .trim()
                .to_string();
            break;
        }

        if reply.is_empty() {
            return Err(Error::Agent(
                "model produced no final text".to_string(),
            ));
        }

        // Only completed turns enter the session
        self.sessions
            .append(&self.config.session_key, StoredRole::User, user_text)?;
        self.sessions
            .append(&self.config.session_key, StoredRole::Assistant, &reply)?;

        Ok(reply)
    }
}
