//! TextBackend trait definition.
//!
//! The text-generation backend is reached over HTTP in production
//! (`HttpTextBackend` in marca-infra). Core code only sees a request going in
//! and a byte stream coming out.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use marca_types::backend::{BackendError, GenerationRequest};

/// Raw response body, chunk by chunk, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BackendError>> + Send + 'static>>;

/// Port for the remote text-generation endpoint.
///
/// Implementations map failures into [`BackendError`]:
/// - no configured destination: `Configuration`
/// - non-success status: `Status` with a message recovered from the body
/// - success without a readable body: `StreamUnavailable`
pub trait TextBackend: Send + Sync {
    /// Issue the request and return the response body stream.
    fn send(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<ByteStream, BackendError>> + Send;
}
