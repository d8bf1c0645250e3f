//! Chat API endpoints: the interaction handler's HTTP face

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::ApiState;
use crate::interaction::{InteractionRequest, Turn};
use crate::voice::VoiceId;

/// Upload cap for recorded audio
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/reset", post(reset))
        .route("/audio/{name}", get(audio))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Response for `/chat` and `/reset`
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub messages: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Map a synthesized audio path to the URL the page fetches it from
fn audio_url(path: &std::path::Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| format!("/api/audio/{name}"))
}

/// Run one interaction
///
/// Multipart fields: `audio` (recorded file, optional), `text` (optional),
/// `voice`, `transcript` (JSON array of turns). Pipeline failures come back
/// as transcript turns, not HTTP errors.
async fn chat(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<ChatResponse>, ChatError> {
    let mut request = InteractionRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ChatError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let file_name = field.file_name().map(ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ChatError::BadRequest(format!("failed to read audio: {e}")))?;
                if !bytes.is_empty() {
                    request.audio = Some(spool_upload(&bytes, file_name.as_deref()).await?);
                }
            }
            "text" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ChatError::BadRequest(format!("failed to read text: {e}")))?;
                request.text = Some(text);
            }
            "voice" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ChatError::BadRequest(format!("failed to read voice: {e}")))?;
                request.voice = VoiceId::parse(&raw)
                    .ok_or_else(|| ChatError::BadRequest(format!("unknown voice: {raw}")))?;
            }
            "transcript" => {
                let raw = field.text().await.map_err(|e| {
                    ChatError::BadRequest(format!("failed to read transcript: {e}"))
                })?;
                request.transcript = serde_json::from_str(&raw)
                    .map_err(|e| ChatError::BadRequest(format!("invalid transcript: {e}")))?;
            }
            _ => {}
        }
    }

    let outcome = state.handler.handle(request).await;

    Ok(Json(ChatResponse {
        audio_url: outcome.audio.as_deref().and_then(audio_url),
        messages: outcome.transcript,
    }))
}

/// Write uploaded audio to a fresh temp file the transcriber can read
async fn spool_upload(bytes: &[u8], file_name: Option<&str>) -> Result<PathBuf, ChatError> {
    // Keep the original extension so the content type survives the hop;
    // anything that is not a short alphanumeric extension is treated as webm
    let suffix = file_name
        .and_then(|n| std::path::Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| ".webm".to_string(), |ext| format!(".{ext}"));

    let spooled = tempfile::Builder::new()
        .prefix("mic_")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| ChatError::Internal(format!("failed to spool upload: {e}")))?;
    let (_, path) = spooled
        .keep()
        .map_err(|e| ChatError::Internal(format!("failed to spool upload: {e}")))?;

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ChatError::Internal(format!("failed to spool upload: {e}")))?;

    Ok(path)
}

/// Reset the conversation: to-do list, session, transcript
async fn reset(State(state): State<Arc<ApiState>>) -> Json<ChatResponse> {
    let outcome = state.handler.reset();

    Json(ChatResponse {
        messages: outcome.transcript,
        audio_url: None,
    })
}

/// Serve one synthesized reply from the temp directory
///
/// Only filenames the synthesizer produces are accepted; anything else is
/// rejected before touching the filesystem.
async fn audio(Path(name): Path<String>) -> Result<Response, ChatError> {
    if !is_reply_file_name(&name) {
        return Err(ChatError::BadRequest(format!("invalid audio name: {name}")));
    }

    let path = std::env::temp_dir().join(&name);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ChatError::NotFound)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        bytes,
    )
        .into_response())
}

/// Accept only `reply_<random>.mp3` with no path tricks
fn is_reply_file_name(name: &str) -> bool {
    name.starts_with("reply_")
        && name.ends_with(".mp3")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.contains("..")
}

/// Chat API errors
#[derive(Debug)]
pub enum ChatError {
    BadRequest(String),
    NotFound,
    Internal(String),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotFound => (StatusCode::NOT_FOUND, "not_found", "no such audio".to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}
