//! Text-to-speech (TTS) processing

use std::path::PathBuf;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::VoiceId;
use crate::{Error, Result};

/// Port for synthesis backends, injectable for tests
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text and return the path of the written audio file
    async fn synthesize(&self, text: &str, voice: VoiceId) -> Result<PathBuf>;
}

/// Synthesizes speech from text via the `OpenAI` audio API
///
/// Each reply lands in a freshly named file under the OS temp directory.
/// The files are single-use and never cleaned up.
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl TextToSpeech {
    /// Create a new TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Synthesizer for TextToSpeech {
    async fn synthesize(&self, text: &str, voice: VoiceId) -> Result<PathBuf> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: voice.as_str(),
        };

        tracing::debug!(voice = %voice, chars = text.len(), "starting synthesis");

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "speech API error");
            return Err(Error::Tts(format!("speech API error {status}: {body}")));
        }

        // Persisted on creation: the path outlives the interaction so the
        // browser can fetch it afterwards.
        let (file, path) = tempfile::Builder::new()
            .prefix("reply_")
            .suffix(".mp3")
            .tempfile()
            .map_err(|e| Error::Tts(format!("failed to create audio file: {e}")))?
            .keep()
            .map_err(|e| Error::Tts(format!("failed to persist audio file: {e}")))?;

        // Stream the body chunk by chunk; the full audio is never held in
        // memory.
        let mut file = tokio::fs::File::from_std(file);
        let mut stream = response.bytes_stream();
        let mut written = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Tts(format!("audio stream error: {e}")))?;
            written += chunk.len();
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::Tts(format!("failed to write audio: {e}")))?;
        }

        file.flush()
            .await
            .map_err(|e| Error::Tts(format!("failed to flush audio: {e}")))?;

        tracing::info!(path = %path.display(), bytes = written, "synthesis complete");
        Ok(path)
    }
}
