//! Configuration management for the hisho gateway

use std::path::PathBuf;

use crate::{Error, Result};

/// Session key for the single shared conversation
///
/// The session store is keyed by this fixed identifier; per-user isolation
/// is a known gap inherited from the single-tenant design.
pub const DEFAULT_SESSION_KEY: &str = "voice_secretary";

/// Hisho gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `OpenAI` API key (required)
    pub api_key: String,

    /// Path to data directory (session database)
    pub data_dir: PathBuf,

    /// Path to static files directory (web UI), if present
    pub static_dir: Option<PathBuf>,

    /// Session key for conversation history
    pub session_key: String,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// LLM configuration
    pub llm: LlmConfig,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model (e.g. "gpt-4o-mini-transcribe")
    pub stt_model: String,

    /// TTS model (e.g. "gpt-4o-mini-tts")
    pub tts_model: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_model: "gpt-4o-mini-transcribe".to_string(),
            tts_model: "gpt-4o-mini-tts".to_string(),
        }
    }
}

/// LLM configuration for the secretary agent
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat model identifier
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: u32,

    /// Max tool-call rounds per turn
    pub max_iterations: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            max_iterations: 8,
        }
    }
}

impl Config {
    /// Load configuration from the environment
    ///
    /// The process must not come up without a provider credential, so a
    /// missing `OPENAI_API_KEY` is fatal here, before the server binds.
    ///
    /// # Errors
    ///
    /// Returns error if `OPENAI_API_KEY` is not set or empty
    pub fn load(data_dir: Option<PathBuf>, static_dir: Option<PathBuf>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::from_api_key(api_key, data_dir, static_dir)
    }

    /// Build configuration from an explicit API key
    ///
    /// # Errors
    ///
    /// Returns error if the key is empty
    pub fn from_api_key(
        api_key: String,
        data_dir: Option<PathBuf>,
        static_dir: Option<PathBuf>,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config(
                "environment variable OPENAI_API_KEY is not set".to_string(),
            ));
        }

        let data_dir = data_dir.unwrap_or_else(|| PathBuf::from("data"));
        let static_dir = static_dir
            .or_else(|| {
                let dir = PathBuf::from("static");
                dir.is_dir().then_some(dir)
            });

        Ok(Self {
            api_key,
            data_dir,
            static_dir,
            session_key: DEFAULT_SESSION_KEY.to_string(),
            voice: VoiceConfig::default(),
            llm: LlmConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_fatal() {
        let err = Config::from_api_key(String::new(), None, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn whitespace_api_key_is_fatal() {
        assert!(Config::from_api_key("  ".to_string(), None, None).is_err());
    }

    #[test]
    fn defaults_are_applied() {
        let config = Config::from_api_key("sk-test".to_string(), None, None).unwrap();
        assert_eq!(config.session_key, DEFAULT_SESSION_KEY);
        assert_eq!(config.voice.stt_model, "gpt-4o-mini-transcribe");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }
}
