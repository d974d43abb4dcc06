//! Ephemeral streaming display state.

use serde::{Deserialize, Serialize};

/// What the UI shows for the in-flight assistant reply.
///
/// `generation` identifies the session that produced `text`. A new session
/// (or an explicit supersede) bumps it, which invalidates older publishers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub generation: u64,
    pub text: String,
    pub busy: bool,
}
