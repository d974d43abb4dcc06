//! ImageStore trait definition.
//!
//! Blob storage for uploaded chat images. The local filesystem adapter lives
//! in marca-infra (`LocalImageStore`).

use marca_types::image::UploadError;

/// Port for the image blob store.
///
/// Paths are relative object keys as produced by
/// [`ImageKey::object_path`](marca_types::image::ImageKey::object_path).
pub trait ImageStore: Send + Sync {
    /// Store `data` under `path`, replacing any existing object.
    fn upload(
        &self,
        path: &str,
        data: &[u8],
        mime_type: &str,
    ) -> impl std::future::Future<Output = Result<(), UploadError>> + Send;

    /// Publicly resolvable URL for a stored object.
    fn public_url(&self, path: &str) -> String;
}
