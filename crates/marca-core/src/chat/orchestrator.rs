//! Turn orchestration.
//!
//! `TurnOrchestrator` sequences one user turn end to end: persist the user
//! turn, upload its images, maybe set the conversation title, route the text
//! to the questionnaire or the backend, and persist the reply. It is generic
//! over the repository, image store and backend ports so marca-core never
//! depends on marca-infra.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use marca_types::backend::{BackendError, GenerationRequest};
use marca_types::config::ClientConfig;
use marca_types::conversation::{
    Conversation, IMAGE_ONLY_PLACEHOLDER, IMAGE_ONLY_TITLE, Turn, derive_title,
};
use marca_types::error::{ChatError, RepositoryError};
use marca_types::image::{ImageAttachment, ImageKey, ImageRecord, UploadError};
use marca_types::questionnaire::{Answers, QuestionnaireScript};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::TextBackend;
use crate::chat::handle::ConversationHandle;
use crate::chat::repository::ConversationRepository;
use crate::data_url;
use crate::questionnaire::QuestionnaireStep;
use crate::questionnaire::branding::branding_script;
use crate::storage::ImageStore;
use crate::stream::{StreamFeed, stream_reply};

/// Settings the orchestrator needs from the client configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub owner_id: String,
    pub title_max_chars: usize,
    pub questionnaire: QuestionnaireScript,
}

impl OrchestratorConfig {
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            owner_id: config.user_id.clone(),
            title_max_chars: config.title_max_chars,
            questionnaire: config
                .questionnaire
                .clone()
                .unwrap_or_else(branding_script),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_client_config(&ClientConfig::default())
    }
}

/// How a submitted turn was answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Backend reply, persisted after the stream settled.
    Streamed(Turn),
    /// Next questionnaire question.
    Scripted(Turn),
    /// Questionnaire summary plus the collected answers.
    QuestionnaireComplete { turn: Turn, answers: Answers },
    /// The stream was superseded before it settled. Nothing was persisted.
    Superseded,
}

impl Reply {
    /// The persisted assistant turn, if any.
    pub fn turn(&self) -> Option<&Turn> {
        match self {
            Reply::Streamed(turn)
            | Reply::Scripted(turn)
            | Reply::QuestionnaireComplete { turn, .. } => Some(turn),
            Reply::Superseded => None,
        }
    }
}

/// Result of [`TurnOrchestrator::submit_turn`].
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The persisted user turn; `images` holds public URLs of the uploads
    /// that succeeded.
    pub user_turn: Turn,
    pub reply: Reply,
    pub attempted_uploads: usize,
    pub upload_failures: usize,
}

impl TurnOutcome {
    /// True when images were attached and none of them could be stored.
    pub fn all_uploads_failed(&self) -> bool {
        self.attempted_uploads > 0 && self.upload_failures == self.attempted_uploads
    }
}

/// Coordinates conversations and turns across the ports.
pub struct TurnOrchestrator<R, S, B>
where
    R: ConversationRepository,
    S: ImageStore,
    B: TextBackend,
{
    repo: R,
    images: S,
    backend: B,
    /// Feed of the conversation the UI is showing.
    active_feed: Mutex<Option<Arc<StreamFeed>>>,
    config: OrchestratorConfig,
}

impl<R, S, B> TurnOrchestrator<R, S, B>
where
    R: ConversationRepository,
    S: ImageStore,
    B: TextBackend,
{
    pub fn new(repo: R, images: S, backend: B, config: OrchestratorConfig) -> Self {
        Self {
            repo,
            images,
            backend,
            active_feed: Mutex::new(None),
            config,
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // --- Conversation lifecycle ---

    /// Persist a new conversation and make it the active one.
    pub async fn create_conversation(
        &self,
        title: Option<String>,
    ) -> Result<ConversationHandle, ChatError> {
        let conversation = Conversation::new(self.config.owner_id.clone(), title);
        let created = self.repo.create_conversation(&conversation).await?;

        info!(conversation_id = %created.id, title = %created.title, "created conversation");
        Ok(self.activate(self.handle(created, 0)))
    }

    /// Load an existing conversation and make it the active one.
    pub async fn open_conversation(&self, id: &Uuid) -> Result<ConversationHandle, ChatError> {
        let conversation = self
            .repo
            .get_conversation(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let turn_count = self.repo.count_turns(id).await?;

        debug!(conversation_id = %id, turn_count, "opened conversation");
        Ok(self.activate(self.handle(conversation, turn_count)))
    }

    /// The owner's conversations, most recently updated first.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ChatError> {
        Ok(self
            .repo
            .list_conversations(&self.config.owner_id, None, None)
            .await?)
    }

    pub async fn delete_conversation(&self, id: &Uuid) -> Result<(), ChatError> {
        self.repo.delete_conversation(id).await?;
        info!(conversation_id = %id, "deleted conversation");
        Ok(())
    }

    /// Persisted turns in creation order, with image paths resolved to URLs.
    pub async fn history(&self, handle: &ConversationHandle) -> Result<Vec<Turn>, ChatError> {
        let mut turns = self.repo.get_turns(&handle.id()).await?;
        for turn in &mut turns {
            for image in &mut turn.images {
                *image = self.images.public_url(image);
            }
        }
        Ok(turns)
    }

    // --- Questionnaire ---

    /// Start (or restart) the questionnaire and persist its first question.
    ///
    /// Any in-flight stream of this conversation is superseded. If the
    /// question cannot be persisted the engine returns to its previous state.
    pub async fn start_questionnaire(
        &self,
        handle: &mut ConversationHandle,
    ) -> Result<Turn, ChatError> {
        let previous = handle.questionnaire().state().clone();
        let question = handle.questionnaire_mut().start()?;
        handle.feed().supersede();

        let turn = Turn::assistant(handle.id(), question);
        if let Err(e) = self.persist_reply(handle, &turn).await {
            warn!(conversation_id = %handle.id(), error = %e, "failed to persist first question");
            handle.questionnaire_mut().restore(previous);
            return Err(e);
        }

        info!(conversation_id = %handle.id(), "questionnaire started");
        Ok(turn)
    }

    // --- Turns ---

    /// Submit one user turn and produce the reply.
    ///
    /// On failure after the user turn is persisted, the user turn stays, no
    /// assistant turn is written and the conversation's feed is settled.
    /// Once the reply is persisted the turn succeeds even if the
    /// conversation's timestamp cannot be bumped.
    #[tracing::instrument(
        name = "submit_turn",
        skip(self, handle, text, images),
        fields(conversation_id = %handle.id(), images = images.len())
    )]
    pub async fn submit_turn(
        &self,
        handle: &mut ConversationHandle,
        text: &str,
        images: Vec<ImageAttachment>,
    ) -> Result<TurnOutcome, ChatError> {
        let has_text = !text.trim().is_empty();
        if !has_text && images.is_empty() {
            return Err(ChatError::EmptyTurn);
        }

        let first_turn = handle.turn_count() == 0;
        let content = if has_text { text } else { IMAGE_ONLY_PLACEHOLDER };
        let mut user_turn = Turn::user(handle.id(), content);
        self.repo.save_turn(&user_turn).await?;
        handle.record_turn();

        let mut upload_failures = 0;
        if !images.is_empty() {
            let (urls, failures) = self.upload_images(handle, &user_turn, &images).await;
            user_turn.images = urls;
            upload_failures = failures;
        }

        if first_turn {
            let title = if has_text {
                derive_title(text, self.config.title_max_chars)
            } else {
                Some(IMAGE_ONLY_TITLE.to_string())
            };
            if let Some(title) = title {
                self.repo.update_title(&handle.id(), &title).await?;
                handle.conversation_mut().title = title;
            }
        }

        let reply = if handle.questionnaire().is_active() {
            self.answer_questionnaire(handle, text).await?
        } else {
            let prompt = if has_text { text } else { "" };
            self.stream_backend_reply(handle, prompt, &images).await?
        };

        if !matches!(reply, Reply::Superseded) {
            if let Err(e) = self.repo.touch(&handle.id(), Utc::now()).await {
                warn!(
                    conversation_id = %handle.id(),
                    error = %e,
                    "failed to bump conversation timestamp"
                );
            }
        }

        Ok(TurnOutcome {
            user_turn,
            reply,
            attempted_uploads: images.len(),
            upload_failures,
        })
    }

    async fn answer_questionnaire(
        &self,
        handle: &mut ConversationHandle,
        text: &str,
    ) -> Result<Reply, ChatError> {
        let previous = handle.questionnaire().state().clone();
        let step = handle.questionnaire_mut().answer(text)?;

        let (turn, reply) = match step {
            QuestionnaireStep::Next { text } => {
                let turn = Turn::assistant(handle.id(), text);
                (turn.clone(), Reply::Scripted(turn))
            }
            QuestionnaireStep::Complete { summary, answers } => {
                let turn = Turn::assistant(handle.id(), summary);
                info!(
                    conversation_id = %handle.id(),
                    answers = answers.len(),
                    "questionnaire completed"
                );
                (turn.clone(), Reply::QuestionnaireComplete { turn, answers })
            }
        };

        if let Err(e) = self.persist_reply(handle, &turn).await {
            handle.questionnaire_mut().restore(previous);
            return Err(e);
        }
        Ok(reply)
    }

    async fn stream_backend_reply(
        &self,
        handle: &mut ConversationHandle,
        prompt: &str,
        images: &[ImageAttachment],
    ) -> Result<Reply, ChatError> {
        let inline = images.iter().map(data_url::inline_image).collect();
        let request = GenerationRequest::new(handle.id(), prompt, inline);

        let ticket = handle.feed().begin();
        let text = match stream_reply(&self.backend, &request, &ticket).await {
            Ok(text) => text,
            Err(e) => {
                log_backend_failure(&handle.id(), &e);
                ticket.settle();
                return Err(e.into());
            }
        };

        if !ticket.is_current() {
            debug!(
                conversation_id = %handle.id(),
                generation = ticket.generation(),
                "discarding superseded reply"
            );
            return Ok(Reply::Superseded);
        }

        let turn = Turn::assistant(handle.id(), text);
        let persisted = self.persist_reply(handle, &turn).await;
        ticket.settle();
        persisted?;
        Ok(Reply::Streamed(turn))
    }

    async fn persist_reply(
        &self,
        handle: &mut ConversationHandle,
        turn: &Turn,
    ) -> Result<(), ChatError> {
        self.repo.save_turn(turn).await?;
        handle.record_turn();
        debug!(conversation_id = %handle.id(), turn_id = %turn.id, role = %turn.role, "turn persisted");
        Ok(())
    }

    /// Upload every image independently. Returns the public URLs of the
    /// uploads that succeeded and the number that failed.
    async fn upload_images(
        &self,
        handle: &ConversationHandle,
        user_turn: &Turn,
        images: &[ImageAttachment],
    ) -> (Vec<String>, usize) {
        let mut urls = Vec::with_capacity(images.len());
        let mut failures = 0;
        let mut last_millis = i64::MIN;

        for image in images {
            // Keep object paths unique within the turn.
            let millis = Utc::now()
                .timestamp_millis()
                .max(last_millis.saturating_add(1));
            last_millis = millis;

            let key = ImageKey {
                owner_id: handle.conversation().owner_id.clone(),
                conversation_id: handle.id(),
                turn_id: user_turn.id,
                extension: image.extension(),
            };
            match self.store_image(&key, millis, image).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    failures += 1;
                    warn!(
                        conversation_id = %handle.id(),
                        file = %image.name,
                        error = %e,
                        "image upload failed, skipping"
                    );
                }
            }
        }
        (urls, failures)
    }

    async fn store_image(
        &self,
        key: &ImageKey,
        millis: i64,
        image: &ImageAttachment,
    ) -> Result<String, UploadError> {
        let path = key.object_path(millis);
        self.images
            .upload(&path, &image.data, &image.mime_type)
            .await?;

        let record = ImageRecord {
            turn_id: key.turn_id,
            conversation_id: key.conversation_id,
            owner_id: key.owner_id.clone(),
            file_name: image.name.clone(),
            file_path: path.clone(),
            size_bytes: image.data.len() as u64,
            mime_type: image.mime_type.clone(),
        };
        self.repo
            .save_image(&record)
            .await
            .map_err(|e| UploadError::Storage(e.to_string()))?;

        Ok(self.images.public_url(&path))
    }

    fn handle(&self, conversation: Conversation, turn_count: u32) -> ConversationHandle {
        ConversationHandle::new(conversation, turn_count, self.config.questionnaire.clone())
    }

    /// Make `handle` the conversation on screen, superseding the stream of
    /// the one it replaces.
    fn activate(&self, handle: ConversationHandle) -> ConversationHandle {
        let previous = self
            .active_feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(handle.feed()));
        if let Some(previous) = previous {
            previous.supersede();
        }
        handle
    }
}

fn log_backend_failure(conversation_id: &Uuid, error: &BackendError) {
    match error {
        BackendError::Configuration(_) => {
            warn!(conversation_id = %conversation_id, error = %error, "backend not configured")
        }
        _ => warn!(conversation_id = %conversation_id, error = %error, "backend reply failed"),
    }
}
