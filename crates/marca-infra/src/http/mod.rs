//! HTTP adapter for the text-generation backend.

pub mod client;

pub use client::HttpTextBackend;
