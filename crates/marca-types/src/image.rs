//! Image attachment types for Marca.
//!
//! Images attached to a user turn are uploaded to the blob store one by one
//! and recorded in the `uploaded_images` table. The same bytes are also sent
//! inline to the backend as base64 data URLs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An image file attached by the user, before upload.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    /// Original file name as chosen by the user.
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageAttachment {
    /// File extension taken from the name (text after the last `.`).
    ///
    /// Falls back to the MIME subtype, then to `bin`.
    pub fn extension(&self) -> String {
        if let Some((_, ext)) = self.name.rsplit_once('.') {
            if !ext.is_empty() {
                return ext.to_lowercase();
            }
        }
        self.mime_type
            .split_once('/')
            .map(|(_, sub)| sub.to_string())
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// Blob store key for one uploaded image.
#[derive(Debug, Clone)]
pub struct ImageKey {
    pub owner_id: String,
    pub conversation_id: Uuid,
    pub turn_id: Uuid,
    pub extension: String,
}

impl ImageKey {
    /// Relative object path: `{owner}/{conversation}/{turn}/{millis}.{ext}`.
    pub fn object_path(&self, timestamp_millis: i64) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            self.owner_id, self.conversation_id, self.turn_id, timestamp_millis, self.extension
        )
    }
}

/// Persisted metadata row for an uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub turn_id: Uuid,
    pub conversation_id: Uuid,
    pub owner_id: String,
    pub file_name: String,
    pub file_path: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// Errors from uploading a single image.
///
/// Never fatal for a turn: the failing file is skipped and the rest are
/// still attempted.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("blob storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str, mime: &str) -> ImageAttachment {
        ImageAttachment {
            name: name.to_string(),
            mime_type: mime.to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_extension_from_name() {
        assert_eq!(attachment("logo.PNG", "image/png").extension(), "png");
        assert_eq!(attachment("a.b.jpeg", "image/jpeg").extension(), "jpeg");
    }

    #[test]
    fn test_extension_falls_back_to_mime() {
        assert_eq!(attachment("logo", "image/webp").extension(), "webp");
        assert_eq!(attachment("logo.", "image/gif").extension(), "gif");
        assert_eq!(attachment("logo", "").extension(), "bin");
    }

    #[test]
    fn test_object_path_layout() {
        let key = ImageKey {
            owner_id: "local".to_string(),
            conversation_id: Uuid::nil(),
            turn_id: Uuid::nil(),
            extension: "png".to_string(),
        };
        let nil = Uuid::nil();
        assert_eq!(key.object_path(42), format!("local/{nil}/{nil}/42.png"));
    }
}
