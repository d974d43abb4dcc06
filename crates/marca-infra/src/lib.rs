//! Infrastructure layer for Marca.
//!
//! Contains implementations of the ports defined in `marca-core`: SQLite
//! conversation storage, the local image store, and the HTTP text backend,
//! plus the data-directory and configuration loaders.

pub mod config;
pub mod filesystem;
pub mod http;
pub mod sqlite;
pub mod storage;
