//! The interaction handler: one user action, start to finish
//!
//! Sequences input resolution → agent run → speech synthesis and merges the
//! results into the chat transcript. Every stage recovers locally: a failed
//! stage becomes a visible assistant turn, never a crash, and never hides
//! what an earlier stage already produced.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::AgentRunner;
use crate::db::SessionStore;
use crate::persona::{EMPTY_INPUT_PROMPT, GREETING};
use crate::tools::TodoList;
use crate::voice::{Synthesizer, Transcriber, VoiceId};

/// Speaker of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// A user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The transcript a fresh page (or a reset) starts from
#[must_use]
pub fn initial_transcript() -> Vec<Turn> {
    vec![Turn::assistant(GREETING)]
}

/// One user action, as received from the UI shell
///
/// The transcript travels with the request: the UI owns it and passes it
/// by value in and out.
#[derive(Debug, Default)]
pub struct InteractionRequest {
    /// Recorded audio file, if the microphone was used (takes priority)
    pub audio: Option<PathBuf>,
    /// Typed text, if any
    pub text: Option<String>,
    /// Voice for the spoken reply
    pub voice: VoiceId,
    /// Transcript so far
    pub transcript: Vec<Turn>,
}

/// Result of one interaction or reset
#[derive(Debug)]
pub struct InteractionOutcome {
    /// Updated transcript
    pub transcript: Vec<Turn>,
    /// Synthesized reply audio, when synthesis succeeded
    pub audio: Option<PathBuf>,
}

/// Orchestrates interactions against the four injected ports
pub struct InteractionHandler {
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    agent: Arc<dyn AgentRunner>,
    sessions: Arc<dyn SessionStore>,
    todos: TodoList,
    session_key: String,
}

impl InteractionHandler {
    /// Create a handler over the given ports
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
        agent: Arc<dyn AgentRunner>,
        sessions: Arc<dyn SessionStore>,
        todos: TodoList,
        session_key: String,
    ) -> Self {
        Self {
            transcriber,
            synthesizer,
            agent,
            sessions,
            todos,
            session_key,
        }
    }

    /// Run one interaction through the pipeline
    ///
    /// Stages are strictly sequential; a transcription failure never
    /// reaches the agent, an agent failure still gets its apology
    /// synthesized, and a synthesis failure never discards the textual
    /// reply.
    pub async fn handle(&self, request: InteractionRequest) -> InteractionOutcome {
        let mut transcript = request.transcript;

        // Input resolution: audio wins over text
        let user_text = if let Some(audio_path) = request.audio {
            match self.transcriber.transcribe(&audio_path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "transcription failed");
                    transcript.push(Turn::assistant(format!("文字起こしエラー: {e}")));
                    return InteractionOutcome {
                        transcript,
                        audio: None,
                    };
                }
            }
        } else {
            request.text.unwrap_or_default().trim().to_string()
        };

        // Empty-input guard: re-prompt, not an error
        if user_text.is_empty() {
            transcript.push(Turn::assistant(EMPTY_INPUT_PROMPT));
            return InteractionOutcome {
                transcript,
                audio: None,
            };
        }

        transcript.push(Turn::user(user_text.clone()));

        // Agent turn: a failure becomes the reply, and is still spoken
        let reply = match self.agent.run(&user_text).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "agent run failed");
                format!("回答生成でエラーが発生しました: {e}")
            }
        };
        transcript.push(Turn::assistant(reply.clone()));

        // Speech synthesis: best effort, text already stands
        let audio = match self.synthesizer.synthesize(&reply, request.voice).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "synthesis failed");
                transcript.push(Turn::assistant(format!("音声合成に失敗しました: {e}")));
                None
            }
        };

        InteractionOutcome { transcript, audio }
    }

    /// Reset everything the user can see
    ///
    /// Clears the to-do list, best-effort clears the session (a cleared UI
    /// is the contract regardless of backend state), and hands back the
    /// greeting transcript.
    #[must_use]
    pub fn reset(&self) -> InteractionOutcome {
        self.todos.clear();

        if let Err(e) = self.sessions.clear(&self.session_key) {
            tracing::warn!(error = %e, "session clear failed during reset");
        }

        InteractionOutcome {
            transcript: initial_transcript(),
            audio: None,
        }
    }
}
