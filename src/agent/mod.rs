//! Secretary agent: chat-completions client and agentic turn runner

pub mod openai;
pub mod runner;

pub use openai::{
    ChatClient, ChatCompletion, ChatMessage, ChatRequest, FunctionCall, FunctionDefinition,
    ToolCall, ToolDefinition,
};
pub use runner::{AgentConfig, AgentRunner, SecretaryAgent};
