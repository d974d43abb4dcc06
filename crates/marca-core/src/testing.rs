//! In-memory fakes of the core ports, shared by unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream;
use tokio::sync::mpsc;
use marca_types::backend::{BackendError, GenerationRequest};
use marca_types::conversation::{Conversation, Turn, TurnRole};
use marca_types::error::RepositoryError;
use marca_types::image::{ImageRecord, UploadError};
use uuid::Uuid;

use crate::backend::{ByteStream, TextBackend};
use crate::chat::repository::ConversationRepository;
use crate::storage::ImageStore;
use crate::stream::StreamFeed;

// --- Repository ---

#[derive(Default)]
pub struct RepoState {
    pub conversations: Vec<Conversation>,
    pub turns: Vec<Turn>,
    pub images: Vec<ImageRecord>,
    /// Reject saving turns with this role.
    pub fail_turns_with_role: Option<TurnRole>,
    /// Reject `touch` calls.
    pub fail_touch: bool,
}

/// Cloneable handle; clones share state so tests can inspect after moving
/// the repository into an orchestrator.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    pub state: Arc<Mutex<RepoState>>,
}

impl MemoryRepository {
    pub fn turns(&self) -> Vec<Turn> {
        self.state.lock().unwrap().turns.clone()
    }

    pub fn images(&self) -> Vec<ImageRecord> {
        self.state.lock().unwrap().images.clone()
    }

    pub fn conversation(&self, id: &Uuid) -> Option<Conversation> {
        self.state
            .lock()
            .unwrap()
            .conversations
            .iter()
            .find(|c| c.id == *id)
            .cloned()
    }

    pub fn fail_turns_with_role(&self, role: Option<TurnRole>) {
        self.state.lock().unwrap().fail_turns_with_role = role;
    }

    pub fn fail_touch(&self, fail: bool) {
        self.state.lock().unwrap().fail_touch = fail;
    }
}

impl ConversationRepository for MemoryRepository {
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl Future<Output = Result<Conversation, RepositoryError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = if state.conversations.iter().any(|c| c.id == conversation.id) {
            Err(RepositoryError::Conflict(conversation.id.to_string()))
        } else {
            state.conversations.push(conversation.clone());
            Ok(conversation.clone())
        };
        async move { result }
    }

    fn get_conversation(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<Conversation>, RepositoryError>> + Send {
        let found = self.conversation(id);
        async move { Ok(found) }
    }

    fn list_conversations(
        &self,
        owner_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send {
        let mut list: Vec<Conversation> = self
            .state
            .lock()
            .unwrap()
            .conversations
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let offset = offset.unwrap_or(0) as usize;
        let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let page = list.into_iter().skip(offset).take(limit).collect();
        async move { Ok(page) }
    }

    fn update_title(
        &self,
        id: &Uuid,
        title: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.conversations.iter_mut().find(|c| c.id == *id) {
            Some(c) => {
                c.title = title.to_string();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        };
        async move { result }
    }

    fn touch(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = if state.fail_touch {
            Err(RepositoryError::Query("database is locked".to_string()))
        } else {
            match state.conversations.iter_mut().find(|c| c.id == *id) {
                Some(c) => {
                    c.updated_at = at;
                    Ok(())
                }
                None => Err(RepositoryError::NotFound),
            }
        };
        async move { result }
    }

    fn delete_conversation(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let mut state = self.state.lock().unwrap();
        let before = state.conversations.len();
        state.conversations.retain(|c| c.id != *id);
        let result = if state.conversations.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            state.turns.retain(|t| t.conversation_id != *id);
            state.images.retain(|i| i.conversation_id != *id);
            Ok(())
        };
        async move { result }
    }

    fn save_turn(&self, turn: &Turn) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = if state.fail_turns_with_role == Some(turn.role) {
            Err(RepositoryError::Query("disk full".to_string()))
        } else {
            let mut stored = turn.clone();
            stored.images.clear();
            state.turns.push(stored);
            Ok(())
        };
        async move { result }
    }

    fn get_turns(
        &self,
        conversation_id: &Uuid,
    ) -> impl Future<Output = Result<Vec<Turn>, RepositoryError>> + Send {
        let state = self.state.lock().unwrap();
        let turns = state
            .turns
            .iter()
            .filter(|t| t.conversation_id == *conversation_id)
            .map(|t| {
                let mut turn = t.clone();
                turn.images = state
                    .images
                    .iter()
                    .filter(|i| i.turn_id == t.id)
                    .map(|i| i.file_path.clone())
                    .collect();
                turn
            })
            .collect();
        async move { Ok(turns) }
    }

    fn count_turns(
        &self,
        conversation_id: &Uuid,
    ) -> impl Future<Output = Result<u32, RepositoryError>> + Send {
        let count = self
            .state
            .lock()
            .unwrap()
            .turns
            .iter()
            .filter(|t| t.conversation_id == *conversation_id)
            .count() as u32;
        async move { Ok(count) }
    }

    fn save_image(
        &self,
        record: &ImageRecord,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        self.state.lock().unwrap().images.push(record.clone());
        async move { Ok(()) }
    }
}

// --- Image store ---

/// Stores paths only. Uploads whose bytes start with `b"bad"` fail.
#[derive(Clone, Default)]
pub struct MemoryImageStore {
    pub uploaded: Arc<Mutex<Vec<String>>>,
}

impl ImageStore for MemoryImageStore {
    fn upload(
        &self,
        path: &str,
        data: &[u8],
        _mime_type: &str,
    ) -> impl Future<Output = Result<(), UploadError>> + Send {
        let result = if data.starts_with(b"bad") {
            Err(UploadError::Storage("rejected".to_string()))
        } else {
            self.uploaded.lock().unwrap().push(path.to_string());
            Ok(())
        };
        async move { result }
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://images.test/{path}")
    }
}

// --- Backend ---

pub enum ScriptedReply {
    Chunks(Vec<&'static str>),
    /// Chunks followed by a mid-stream error.
    Broken(Vec<&'static str>),
    Fail(BackendError),
    /// Body fed by the test; stays pending until the sender sends or drops.
    Live(mpsc::UnboundedReceiver<&'static str>),
}

impl ScriptedReply {
    /// A live reply and the sender that feeds its body.
    pub fn live() -> (mpsc::UnboundedSender<&'static str>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::Live(rx))
    }
}

#[derive(Default)]
pub struct BackendState {
    pub replies: VecDeque<ScriptedReply>,
    pub requests: Vec<GenerationRequest>,
    /// Superseded when a request is sent, simulating the user switching
    /// conversations while the reply is in flight.
    pub supersede_on_send: Option<Arc<StreamFeed>>,
}

/// Replays scripted replies in order; an empty queue yields an empty body.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    pub state: Arc<Mutex<BackendState>>,
}

impl ScriptedBackend {
    pub fn with_replies(replies: Vec<ScriptedReply>) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().replies = replies.into();
        backend
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn supersede_on_send(&self, feed: Arc<StreamFeed>) {
        self.state.lock().unwrap().supersede_on_send = Some(feed);
    }
}

fn body(chunks: Vec<&'static str>, error: Option<BackendError>) -> ByteStream {
    let mut items: Vec<Result<Bytes, BackendError>> = chunks
        .into_iter()
        .map(|c| Ok(Bytes::from_static(c.as_bytes())))
        .collect();
    items.extend(error.map(Err));
    Box::pin(stream::iter(items))
}

fn live_body(rx: mpsc::UnboundedReceiver<&'static str>) -> ByteStream {
    Box::pin(stream::unfold(rx, |mut rx| async move {
        let chunk = rx.recv().await?;
        Some((Ok(Bytes::from_static(chunk.as_bytes())), rx))
    }))
}

impl TextBackend for ScriptedBackend {
    fn send(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<ByteStream, BackendError>> + Send {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        if let Some(feed) = &state.supersede_on_send {
            feed.supersede();
        }
        let result = match state.replies.pop_front() {
            None => Ok(body(Vec::new(), None)),
            Some(ScriptedReply::Chunks(chunks)) => Ok(body(chunks, None)),
            Some(ScriptedReply::Broken(chunks)) => Ok(body(
                chunks,
                Some(BackendError::Stream("connection reset".to_string())),
            )),
            Some(ScriptedReply::Fail(err)) => Err(err),
            Some(ScriptedReply::Live(rx)) => Ok(live_body(rx)),
        };
        async move { result }
    }
}
