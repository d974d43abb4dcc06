//! Observability for Marca: structured logging via `tracing`, with optional
//! OpenTelemetry span export for local debugging.

pub mod tracing_setup;

pub use tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
