//! Business logic and port definitions for Marca.
//!
//! This crate defines the ports (repository, image store, text backend) that
//! the infrastructure layer implements, plus the pure pieces of the chat
//! client: stream decoding and extraction, the stream feed, the guided
//! questionnaire, and turn orchestration. It depends only on `marca-types`
//! and never on `marca-infra` or any database/IO crate.

pub mod backend;
pub mod chat;
pub mod data_url;
pub mod questionnaire;
pub mod storage;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;
