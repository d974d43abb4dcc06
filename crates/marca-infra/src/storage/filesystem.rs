//! Local filesystem image store implementation.
//!
//! Implements the `ImageStore` trait from `marca-core` with objects stored at
//! `{data_dir}/chat-images/{owner}/{conversation}/{turn}/{millis}.{ext}`.

use std::path::{Component, Path, PathBuf};

use marca_core::storage::ImageStore;
use marca_types::image::UploadError;
use tracing::debug;

/// Image store writing plain files under one base directory.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    /// Create a store rooted at `base_dir`.
    ///
    /// Public URLs are `{public_base_url}/{path}`; without a configured base
    /// they are `file://` URLs into `base_dir`.
    pub fn new(base_dir: PathBuf, public_base_url: Option<String>) -> Self {
        let public_base_url = public_base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| format!("file://{}", base_dir.display()));
        Self {
            base_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve an object path on disk, rejecting anything that would escape
    /// the base directory.
    fn object_file(&self, path: &str) -> Result<PathBuf, UploadError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(UploadError::Storage(format!("invalid object path: {path}")));
        }
        Ok(self.base_dir.join(relative))
    }
}

impl ImageStore for LocalImageStore {
    async fn upload(&self, path: &str, data: &[u8], mime_type: &str) -> Result<(), UploadError> {
        let file = self.object_file(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| UploadError::Io(e.to_string()))?;
        }
        tokio::fs::write(&file, data)
            .await
            .map_err(|e| UploadError::Io(e.to_string()))?;

        debug!(path, mime_type, size = data.len(), "stored image");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }
}
