//! Per-conversation state held by the caller between turns.

use std::sync::Arc;

use marca_types::conversation::Conversation;
use marca_types::questionnaire::QuestionnaireScript;
use uuid::Uuid;

use crate::questionnaire::QuestionnaireEngine;
use crate::stream::StreamFeed;

/// An open conversation.
///
/// Tracks the persisted turn count (to detect the first turn) and owns the
/// conversation's questionnaire engine and stream feed. Questionnaire
/// progress is not persisted; reopening a conversation starts with an
/// inactive engine. Clones share the feed.
#[derive(Debug, Clone)]
pub struct ConversationHandle {
    conversation: Conversation,
    turn_count: u32,
    questionnaire: QuestionnaireEngine,
    feed: Arc<StreamFeed>,
}

impl ConversationHandle {
    pub fn new(conversation: Conversation, turn_count: u32, script: QuestionnaireScript) -> Self {
        let questionnaire = QuestionnaireEngine::new(script).with_conversation_id(conversation.id);
        Self {
            conversation,
            turn_count,
            questionnaire,
            feed: StreamFeed::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.conversation.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn title(&self) -> &str {
        &self.conversation.title
    }

    /// Number of turns persisted in this conversation so far.
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Streaming text of this conversation's in-flight reply.
    pub fn feed(&self) -> &Arc<StreamFeed> {
        &self.feed
    }

    pub fn questionnaire(&self) -> &QuestionnaireEngine {
        &self.questionnaire
    }

    pub(crate) fn questionnaire_mut(&mut self) -> &mut QuestionnaireEngine {
        &mut self.questionnaire
    }

    pub(crate) fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub(crate) fn record_turn(&mut self) {
        self.turn_count += 1;
    }
}
