//! Text-generation backend request and error types.
//!
//! The backend receives a JSON body and answers with a byte stream in one of
//! three framings (SSE, JSON lines, plain text). Only the request shape and
//! the failure taxonomy live here; the HTTP client is in marca-infra.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prompt sent when the user attaches images without any text.
pub const IMAGE_ONLY_PROMPT: &str = "Describe esta imagen";

/// Fallback error message when a failed response carries no usable body.
pub const DEFAULT_BACKEND_ERROR: &str = "error connecting to the text-generation backend";

/// An image sent inline with the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    /// Base64 data URL (`data:{mime};base64,...`).
    pub data: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Request body for the text-generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub conversation_id: Uuid,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<InlineImage>>,
}

impl GenerationRequest {
    /// Build a request, substituting the image-only prompt when needed.
    pub fn new(conversation_id: Uuid, text: &str, images: Vec<InlineImage>) -> Self {
        let prompt = if text.is_empty() && !images.is_empty() {
            IMAGE_ONLY_PROMPT.to_string()
        } else {
            text.to_string()
        };
        Self {
            conversation_id,
            prompt,
            images: if images.is_empty() { None } else { Some(images) },
        }
    }
}

/// Errors from the text-generation backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No backend destination configured. Fatal, never retried.
    #[error("backend not configured: {0}")]
    Configuration(String),

    /// Non-success HTTP status, with a message recovered from the body.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// The response exposed no readable body stream.
    #[error("backend response has no readable stream")]
    StreamUnavailable,

    #[error("request failed: {0}")]
    Transport(String),

    /// The body stream broke after it started.
    #[error("response stream error: {0}")]
    Stream(String),
}

/// Recover a human-readable message from a failed response body.
///
/// Tries a JSON `error` string, then a JSON `message` string, then the raw
/// body text, then [`DEFAULT_BACKEND_ERROR`].
pub fn error_message_from_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let field = ["error", "message"]
            .iter()
            .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .find(|s| !s.is_empty());
        if let Some(message) = field {
            return message.to_string();
        }
    }
    if body.trim().is_empty() {
        DEFAULT_BACKEND_ERROR.to_string()
    } else {
        body.to_string()
    }
}
