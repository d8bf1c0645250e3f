//! Shared test utilities: in-memory store and port doubles

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use hisho_gateway::db::{self, DbPool, SessionRepo, SessionStore};
use hisho_gateway::{
    AgentRunner, Error, InteractionHandler, Result, SecretaryTools, Synthesizer, TodoList,
    Transcriber, VoiceId,
};

/// Session key used across the integration tests
pub const TEST_SESSION_KEY: &str = "test_session";

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Transcriber double returning a fixed transcript
pub struct FixedTranscriber(pub String);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Transcriber double that always fails
pub struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
        Err(Error::Stt("provider unreachable".to_string()))
    }
}

/// Agent double that echoes and counts invocations
#[derive(Default)]
pub struct EchoAgent {
    pub calls: AtomicUsize,
}

#[async_trait]
impl AgentRunner for EchoAgent {
    async fn run(&self, user_text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("承知しました: {user_text}"))
    }
}

/// Agent double that always fails
pub struct FailingAgent;

#[async_trait]
impl AgentRunner for FailingAgent {
    async fn run(&self, _user_text: &str) -> Result<String> {
        Err(Error::Agent("model unavailable".to_string()))
    }
}

/// Agent double that answers by invoking the real `list_todo` tool
pub struct ListTodoAgent {
    pub tools: SecretaryTools,
}

#[async_trait]
impl AgentRunner for ListTodoAgent {
    async fn run(&self, _user_text: &str) -> Result<String> {
        let listed = self.tools.execute("list_todo", "{}")?;
        Ok(format!("現在のタスク: {listed}"))
    }
}

/// Synthesizer double writing a tiny file into the OS temp directory
pub struct StubSynthesizer;

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: VoiceId) -> Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix("reply_")
            .suffix(".mp3")
            .tempfile()
            .map_err(|e| Error::Tts(e.to_string()))?;
        let (_, path) = file.keep().map_err(|e| Error::Tts(e.to_string()))?;
        tokio::fs::write(&path, b"ID3").await?;
        Ok(path)
    }
}

/// Synthesizer double that always fails
pub struct FailingSynthesizer;

#[async_trait]
impl Synthesizer for FailingSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: VoiceId) -> Result<PathBuf> {
        Err(Error::Tts("no audio backend".to_string()))
    }
}

/// Assemble a handler from doubles, sharing one to-do list and session repo
pub fn build_handler(
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    agent: Arc<dyn AgentRunner>,
    pool: &DbPool,
    todos: TodoList,
) -> InteractionHandler {
    let sessions: Arc<dyn SessionStore> = Arc::new(SessionRepo::new(pool.clone()));
    InteractionHandler::new(
        transcriber,
        synthesizer,
        agent,
        sessions,
        todos,
        TEST_SESSION_KEY.to_string(),
    )
}
