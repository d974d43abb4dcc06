//! Client configuration loader for Marca.
//!
//! Reads `config.toml` from the data directory (`~/.marca/` in production)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when the
//! file is missing or malformed, then applies environment overrides.

use std::path::Path;

use marca_types::config::ClientConfig;

/// Environment variable overriding `backend_url`.
pub const BACKEND_URL_ENV: &str = "MARCA_BACKEND_URL";

/// Environment variable overriding `backend_token`.
pub const BACKEND_TOKEN_ENV: &str = "MARCA_BACKEND_TOKEN";

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, starts from [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and starts from the default.
/// - Environment overrides are applied last.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let mut config = read_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> ClientConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

/// Apply environment overrides. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_empty(BACKEND_URL_ENV) {
        config.backend_url = Some(url);
    }
    if let Some(token) = non_empty(BACKEND_TOKEN_ENV) {
        config.backend_token = Some(token);
    }
}
