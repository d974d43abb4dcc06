//! Shared domain types for Marca.
//!
//! This crate contains the domain types used across the chat client:
//! conversations and turns, image attachments, the backend request shape,
//! questionnaire scripts, streaming display state, configuration, and the
//! error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod backend;
pub mod config;
pub mod conversation;
pub mod error;
pub mod image;
pub mod questionnaire;
pub mod stream;
