//! Image blob storage infrastructure.
//!
//! Implements the `ImageStore` trait from `marca-core` for the local
//! filesystem.

use std::path::Path;

pub mod filesystem;

pub use filesystem::LocalImageStore;

/// Detect an image MIME type from the file extension.
///
/// Used by the CLI when attaching files from disk.
pub fn detect_mime(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Whether a MIME type is an image the chat accepts.
pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}
