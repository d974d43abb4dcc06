//! Data directory layout for Marca.
//!
//! Everything the client stores locally lives under one directory:
//! `config.toml`, the SQLite database, and uploaded images under
//! `chat-images/`.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MARCA_DATA_DIR";

/// Subdirectory holding uploaded chat images.
pub const IMAGES_DIR: &str = "chat-images";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `MARCA_DATA_DIR` environment variable
/// 2. `~/.marca`
/// 3. `.marca` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".marca");
    }

    PathBuf::from(".marca")
}

/// Directory where [`LocalImageStore`](crate::storage::LocalImageStore)
/// writes image bytes.
pub fn images_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(IMAGES_DIR)
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(data_dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(data_dir).await
}
