//! Voice processing: speech-to-text and text-to-speech adapters

pub mod stt;
pub mod tts;

pub use stt::{SpeechToText, Transcriber};
pub use tts::{Synthesizer, TextToSpeech};

use serde::{Deserialize, Serialize};

/// TTS voice identifier
///
/// The fixed set the synthesis endpoint accepts; the web UI offers exactly
/// these choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceId {
    #[default]
    Alloy,
    Shimmer,
    Nova,
    Onyx,
    Echo,
    Fable,
}

impl VoiceId {
    /// All selectable voices, in display order
    pub const ALL: [Self; 6] = [
        Self::Alloy,
        Self::Shimmer,
        Self::Nova,
        Self::Onyx,
        Self::Echo,
        Self::Fable,
    ];

    /// Wire name of the voice
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Shimmer => "shimmer",
            Self::Nova => "nova",
            Self::Onyx => "onyx",
            Self::Echo => "echo",
            Self::Fable => "fable",
        }
    }

    /// Parse a wire name; `None` for anything outside the fixed set
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alloy" => Some(Self::Alloy),
            "shimmer" => Some(Self::Shimmer),
            "nova" => Some(Self::Nova),
            "onyx" => Some(Self::Onyx),
            "echo" => Some(Self::Echo),
            "fable" => Some(Self::Fable),
            _ => None,
        }
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
