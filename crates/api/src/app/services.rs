//! Service wiring: picks the Postgres or in-memory stores and builds the detector.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use mixerp_auth::{RbacRegistry, RolePermissionTable};
use mixerp_infra::config::AppConfig;
use mixerp_infra::dedup::{
    AlertStore, DuplicateDetector, EntitySource, InMemoryAlertStore, InMemoryEntitySource,
    PostgresDedupStore, StoreError,
};

/// Detector over type-erased stores, so both backends share one router type.
pub type Detector = DuplicateDetector<Arc<dyn EntitySource>, Arc<dyn AlertStore>>;

#[derive(Debug, thiserror::Error)]
pub enum ServicesError {
    #[error("failed to connect to postgres: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("failed to prepare alert schema: {0}")]
    Schema(#[from] StoreError),
}

#[derive(Clone)]
pub struct AppServices {
    pub detector: Arc<Detector>,
    pub rbac: Arc<RbacRegistry>,
}

impl AppServices {
    pub fn new(entities: Arc<dyn EntitySource>, alerts: Arc<dyn AlertStore>) -> Self {
        Self {
            detector: Arc::new(DuplicateDetector::new(entities, alerts)),
            rbac: Arc::new(RbacRegistry::from_table(RolePermissionTable::global())),
        }
    }

    /// In-memory wiring (dev/test). The entity source is returned so callers can seed it.
    pub fn in_memory() -> (Self, Arc<InMemoryEntitySource>) {
        let entities = InMemoryEntitySource::arc();
        let alerts = InMemoryAlertStore::arc();
        (Self::new(entities.clone(), alerts), entities)
    }

    pub async fn postgres(database_url: &str) -> Result<Self, ServicesError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        let store = Arc::new(PostgresDedupStore::new(pool));
        store.ensure_schema().await?;

        Ok(Self::new(store.clone(), store))
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, ServicesError> {
        match config.database_url.as_deref() {
            Some(url) => {
                tracing::info!("using postgres-backed duplicate stores");
                Self::postgres(url).await
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory duplicate stores");
                Ok(Self::in_memory().0)
            }
        }
    }
}
