//! Speech-to-text (STT) processing

use std::path::Path;

use async_trait::async_trait;

use crate::{Error, Result};

/// Port for transcription backends, injectable for tests
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a recorded audio file to trimmed text
    ///
    /// An empty string means the provider heard nothing usable.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Response from the transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Transcribes speech to text via the `OpenAI` audio API
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl SpeechToText {
    /// Create a new STT instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

/// Map an audio file extension to the content type sent with the upload
///
/// The browser recorder produces webm, so that is the default.
fn mime_for_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        _ => "audio/webm",
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|e| Error::Stt(format!("failed to read audio file: {e}")))?;

        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.webm")
            .to_string();

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name(file_name)
                    .mime_str(mime_for_extension(audio_path))
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!(
                "transcription API error {status}: {body}"
            )));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        let text = result.text.trim().to_string();
        tracing::info!(transcript = %text, "transcription complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(SpeechToText::new(String::new(), "gpt-4o-mini-transcribe".to_string()).is_err());
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_extension(Path::new("clip.wav")), "audio/wav");
        assert_eq!(mime_for_extension(Path::new("clip.mp3")), "audio/mpeg");
        assert_eq!(mime_for_extension(Path::new("clip.webm")), "audio/webm");
        assert_eq!(mime_for_extension(Path::new("clip")), "audio/webm");
    }

    #[test]
    fn response_text_defaults_to_empty() {
        let parsed: TranscriptionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.text, "");
    }
}
