//! Application state - shared across all handlers.

use std::sync::Arc;

use typelab_core::ports::{BlobStorage, PostRepository, ProfileRepository, UserRepository};
use typelab_infra::{
    InMemoryPostRepository, InMemoryProfileRepository, InMemoryUserRepository, LocalBlobStorage,
};

#[cfg(feature = "postgres")]
use typelab_infra::database::{
    self, PostgresPostRepository, PostgresProfileRepository, PostgresUserRepository,
};

use crate::config::{AppConfig, GardenConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub users: Arc<dyn UserRepository>,
    pub blobs: Arc<dyn BlobStorage>,
    pub garden: GardenConfig,
    pub max_upload_bytes: usize,
    /// Name of the store backing posts, reported by the health check.
    pub backend: &'static str,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let blobs: Arc<dyn BlobStorage> = Arc::new(LocalBlobStorage::new(
            config.media.root.clone(),
            config.media.base_url.clone(),
        ));

        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match database::connect(db_config).await {
                Ok(conn) => {
                    tracing::info!("Application state initialized (postgres)");
                    return Self {
                        posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                        profiles: Arc::new(PostgresProfileRepository::new(conn.clone())),
                        users: Arc::new(PostgresUserRepository::new(conn)),
                        blobs,
                        garden: config.garden,
                        max_upload_bytes: config.media.max_upload_bytes,
                        backend: "postgres",
                    };
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory stores");

        let state = Self::in_memory(blobs, config.garden, config.media.max_upload_bytes);
        tracing::info!("Application state initialized (memory)");
        state
    }

    /// State backed entirely by in-memory stores.
    pub fn in_memory(
        blobs: Arc<dyn BlobStorage>,
        garden: GardenConfig,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            posts: Arc::new(InMemoryPostRepository::new()),
            profiles: Arc::new(InMemoryProfileRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            blobs,
            garden,
            max_upload_bytes,
            backend: "memory",
        }
    }
}
