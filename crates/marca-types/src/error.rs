use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendError;

/// Errors from repository operations (used by trait definitions in marca-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the guided questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionnaireError {
    #[error("questionnaire is not active")]
    NotActive,

    #[error("questionnaire script has no prompts")]
    EmptyScript,
}

/// Errors surfaced at the turn orchestrator boundary.
///
/// Apart from `EmptyTurn`, the user turn is already persisted when any of
/// these is returned from a submitted turn; no assistant turn has been written.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error(transparent)]
    Questionnaire(#[from] QuestionnaireError),

    /// A turn with no text and no images.
    #[error("nothing to send")]
    EmptyTurn,
}

impl ChatError {
    /// Convert into the toast-style notification shown to the user.
    pub fn notification(&self) -> Notification {
        let title = match self {
            ChatError::Backend(BackendError::Configuration(_)) => "Configuración incompleta",
            ChatError::Questionnaire(_) => "Cuestionario",
            _ => "Error",
        };
        Notification {
            title: title.to_string(),
            description: self.to_string(),
        }
    }
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_from_backend_is_transparent() {
        let err: ChatError = BackendError::Status {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "boom (HTTP 500)");
    }

    #[test]
    fn test_configuration_notification_title() {
        let err: ChatError = BackendError::Configuration("backend_url is not set".to_string()).into();
        let note = err.notification();
        assert_eq!(note.title, "Configuración incompleta");
        assert!(note.description.contains("backend_url"));
    }

    #[test]
    fn test_storage_notification() {
        let err: ChatError = RepositoryError::NotFound.into();
        let note = err.notification();
        assert_eq!(note.title, "Error");
        assert_eq!(note.description, "storage error: entity not found");
    }
}
