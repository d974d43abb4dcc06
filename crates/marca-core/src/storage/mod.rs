//! Storage abstractions for Marca.
//!
//! Implementations live in marca-infra.

pub mod image_store;

pub use image_store::ImageStore;
