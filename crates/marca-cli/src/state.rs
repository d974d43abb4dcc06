//! Application state wiring the orchestrator to its concrete adapters.
//!
//! The orchestrator is generic over the repository, image store and backend
//! traits; AppState pins it to the SQLite, local-filesystem and HTTP
//! implementations.

use std::sync::Arc;

use marca_core::chat::{OrchestratorConfig, TurnOrchestrator};
use marca_infra::config::load_client_config;
use marca_infra::filesystem::{ensure_data_dir, images_dir, resolve_data_dir};
use marca_infra::http::HttpTextBackend;
use marca_infra::sqlite::conversation::SqliteConversationRepository;
use marca_infra::sqlite::pool::DatabasePool;
use marca_infra::storage::LocalImageStore;
use marca_types::config::ClientConfig;
use tracing::{debug, warn};

/// The orchestrator pinned to infra implementations.
pub type ConcreteOrchestrator =
    TurnOrchestrator<SqliteConversationRepository, LocalImageStore, HttpTextBackend>;

/// Shared application state for every command.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub config: ClientConfig,
}

impl AppState {
    /// Initialize the application state: config, DB, image store, backend.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir).await?;

        let config = load_client_config(&data_dir).await;

        let db_pool = DatabasePool::open_in(&data_dir).await?;
        let repo = SqliteConversationRepository::new(db_pool);

        let images = LocalImageStore::new(
            images_dir(&data_dir),
            config.public_image_base_url.clone(),
        );

        let backend = HttpTextBackend::from_config(&config)?;
        if !backend.is_configured() {
            warn!("no backend URL configured; replies will fail until one is set");
        }

        let orchestrator = TurnOrchestrator::new(
            repo,
            images,
            backend,
            OrchestratorConfig::from_client_config(&config),
        );
        debug!(data_dir = %data_dir.display(), "application state ready");

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            config,
        })
    }
}
