//! Client configuration types for Marca.
//!
//! `ClientConfig` represents `config.toml` in the data directory. Every field
//! has a default so an empty or missing file is valid.

use serde::{Deserialize, Serialize};

use crate::questionnaire::QuestionnaireScript;

/// Top-level configuration for the chat client.
///
/// Loaded from `~/.marca/config.toml`. Environment overrides are applied by
/// the loader in marca-infra.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Text-generation endpoint. Required only for streamed turns.
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Optional bearer token sent to the backend.
    #[serde(default, skip_serializing)]
    pub backend_token: Option<String>,

    /// Owner id used for conversations and image keys.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Maximum characters of the first user turn used as the title.
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    /// Connect timeout for backend requests. No timeout when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Base URL prepended to stored image paths.
    #[serde(default)]
    pub public_image_base_url: Option<String>,

    /// Custom questionnaire replacing the built-in branding script.
    #[serde(default)]
    pub questionnaire: Option<QuestionnaireScript>,
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_title_max_chars() -> usize {
    50
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_token: None,
            user_id: default_user_id(),
            title_max_chars: default_title_max_chars(),
            request_timeout_secs: None,
            public_image_base_url: None,
            questionnaire: None,
        }
    }
}
