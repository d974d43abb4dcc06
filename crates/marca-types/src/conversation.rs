//! Conversation and turn types for Marca.
//!
//! A conversation is an append-only log of turns between the user and the
//! assistant. Turns are immutable once persisted; streamed assistant text
//! only becomes a `Turn` after the stream settles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Title given to a conversation before its first user turn.
pub const DEFAULT_CONVERSATION_TITLE: &str = "Nuevo chat";

/// Content stored for a user turn that carries only images.
pub const IMAGE_ONLY_PLACEHOLDER: &str = "(imagen)";

/// Title given to a conversation whose first turn carries only images.
pub const IMAGE_ONLY_TITLE: &str = "Chat con imagen";

/// Who authored a turn.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// A conversation between one user and the assistant.
///
/// Only the title and `updated_at` ever change after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// A fresh conversation owned by `owner_id`, not yet persisted.
    pub fn new(owner_id: impl Into<String>, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id: owner_id.into(),
            title: title.unwrap_or_else(|| DEFAULT_CONVERSATION_TITLE.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single message within a conversation.
///
/// Turns are ordered by `created_at` (ties broken by insertion order).
/// `images` holds public URLs resolved by the image store; it is only
/// populated for user turns that had attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: TurnRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(conversation_id: Uuid, content: impl Into<String>) -> Self {
        Self::with_role(conversation_id, TurnRole::User, content.into())
    }

    pub fn assistant(conversation_id: Uuid, content: impl Into<String>) -> Self {
        Self::with_role(conversation_id, TurnRole::Assistant, content.into())
    }

    fn with_role(conversation_id: Uuid, role: TurnRole, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            role,
            content,
            images: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Derive a display title from the first user turn.
///
/// Takes at most `max_chars` characters (not bytes). Returns `None` when the
/// text is empty, in which case the conversation keeps its current title.
pub fn derive_title(text: &str, max_chars: usize) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(max_chars).collect())
}
