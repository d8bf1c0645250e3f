//! Hisho Gateway - voice secretary web app
//!
//! This library provides the core functionality for the hisho gateway:
//! - Voice processing (STT, TTS) via the OpenAI audio APIs
//! - A tool-using secretary agent driven over chat completions
//! - SQLite-backed conversation sessions
//! - The HTTP surface and static web UI
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Web UI (static)                    │
//! │   mic capture │ text box │ voice select │ chat      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ POST /api/chat
//! ┌────────────────────▼────────────────────────────────┐
//! │               Interaction handler                    │
//! │   STT  →  agent (to-do / clock tools)  →  TTS       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                OpenAI HTTP API                       │
//! │   transcriptions │ chat completions │ speech        │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod interaction;
pub mod persona;
pub mod tools;
pub mod voice;

pub use agent::{AgentRunner, SecretaryAgent};
pub use config::Config;
pub use db::{DbConn, DbPool, SessionRepo, SessionStore};
pub use error::{Error, Result};
pub use interaction::{InteractionHandler, InteractionOutcome, InteractionRequest, Role, Turn};
pub use tools::{SecretaryTools, TodoList};
pub use voice::{SpeechToText, Synthesizer, TextToSpeech, Transcriber, VoiceId};
