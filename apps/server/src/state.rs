//! Shared application state

use crate::{
    config::{Config, StoreBackend},
    db::{MemoryDocumentStore, PostgresDocumentStore},
    geocoder::MapQuestGeocoder,
    services::ResourceService,
    Error, Result,
};
use devcamper_query::{DocumentStore, GeoRadiusResolver, Geocoder, QueryCompiler};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub resources: Arc<ResourceService>,
}

impl AppState {
    /// Connect the configured store and geocoder.
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Arc::new(MemoryDocumentStore::new())
            }
            StoreBackend::Postgres => {
                let store = PostgresDocumentStore::connect(&config.database).await?;
                if config.database.run_migrations {
                    store.run_migrations().await?;
                    tracing::info!("Database migrations applied");
                }
                Arc::new(store)
            }
        };

        let geocoder = MapQuestGeocoder::from_config(&config.geocoder)
            .map_err(|e| Error::Internal(format!("Failed to build geocoder client: {e}")))?;

        Ok(Self::with_collaborators(config, store, Arc::new(geocoder)))
    }

    /// Build the state around an existing store and geocoder.
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn DocumentStore>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        let resources = Arc::new(ResourceService::new(
            store.clone(),
            geocoder.clone(),
            QueryCompiler::new(config.query.clone()),
            GeoRadiusResolver::new(config.geo.earth_radius),
            config.geo.default_unit,
        ));

        Self {
            config: Arc::new(config),
            store,
            geocoder,
            resources,
        }
    }
}
