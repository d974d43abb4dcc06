//! Incremental ingestion of streamed backend replies.
//!
//! Bytes flow through [`decoder::FrameDecoder`] into logical lines, each line
//! is classified and reduced to a text delta by [`extract`], and
//! [`session::StreamingSession`] accumulates the deltas and publishes them
//! through a [`feed::StreamFeed`].

pub mod decoder;
pub mod extract;
pub mod feed;
pub mod session;

pub use decoder::FrameDecoder;
pub use extract::{Extraction, LineShape, SkipReason, classify, extract};
pub use feed::{StreamFeed, StreamTicket};
pub use session::{StreamState, StreamingSession, stream_reply};
