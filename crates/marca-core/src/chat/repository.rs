//! ConversationRepository trait definition.
//!
//! CRUD for conversations, their turns, and uploaded image metadata.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use chrono::{DateTime, Utc};
use marca_types::conversation::{Conversation, Turn};
use marca_types::error::RepositoryError;
use marca_types::image::ImageRecord;
use uuid::Uuid;

/// Repository trait for conversation persistence.
///
/// Implementations live in marca-infra (`SqliteConversationRepository`).
pub trait ConversationRepository: Send + Sync {
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    fn get_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List an owner's conversations, most recently updated first.
    fn list_conversations(
        &self,
        owner_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    fn update_title(
        &self,
        id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Set `updated_at` without changing anything else.
    fn touch(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a conversation together with its turns and image rows.
    ///
    /// Returns `RepositoryError::NotFound` when no such conversation exists.
    fn delete_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a turn. `turn.images` is ignored; image rows are saved with
    /// [`save_image`](Self::save_image).
    fn save_turn(
        &self,
        turn: &Turn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All turns of a conversation in creation order.
    ///
    /// Each turn's `images` holds the stored object paths of its uploads.
    fn get_turns(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    fn count_turns(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;

    fn save_image(
        &self,
        record: &ImageRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
