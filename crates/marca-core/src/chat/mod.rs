//! Conversation persistence port and turn orchestration.
//!
//! [`TurnOrchestrator`] coordinates the repository, the image store, the
//! questionnaire engine and the text backend for every user turn.

pub mod handle;
pub mod orchestrator;
pub mod repository;

pub use handle::ConversationHandle;
pub use orchestrator::{OrchestratorConfig, Reply, TurnOrchestrator, TurnOutcome};
pub use repository::ConversationRepository;
