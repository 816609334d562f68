use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, StoreBackend};
use crate::mastery::{EngineConfig, MasteryEngine};
use crate::progression::{CatalogError, CourseCatalog, ProgressionGraph};
use crate::seed::{seed_skill_priors, SeedError};
use crate::store::{InMemoryStateStore, SqliteStateStore, StateStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("state store: {0}")]
    Store(#[from] StoreError),
    #[error("course catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("skill priors: {0}")]
    Seed(#[from] SeedError),
}

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    engine: Arc<MasteryEngine>,
    progression: Arc<ProgressionGraph>,
}

impl AppState {
    pub fn new(engine: Arc<MasteryEngine>, catalog: Arc<CourseCatalog>) -> Self {
        let progression = Arc::new(ProgressionGraph::new(catalog, Arc::clone(&engine)));
        Self {
            started_at: Instant::now(),
            engine,
            progression,
        }
    }

    pub fn in_memory(engine_config: EngineConfig, catalog: CourseCatalog) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        Self::new(
            Arc::new(MasteryEngine::new(engine_config, store)),
            Arc::new(catalog),
        )
    }

    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let store = open_store(&config.store).await?;
        let catalog = match &config.catalog_path {
            Some(path) => CourseCatalog::load(path)?,
            None => CourseCatalog::builtin()?,
        };
        tracing::info!(backend = store.backend(), courses = catalog.len(), "state initialized");

        let engine = Arc::new(MasteryEngine::new(EngineConfig::from_env(), store));
        if let Some(path) = &config.skill_priors_path {
            let count = seed_skill_priors(&engine, path).await?;
            tracing::info!(count, path = %path.display(), "skill priors loaded");
        }

        Ok(Self::new(engine, Arc::new(catalog)))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn engine(&self) -> Arc<MasteryEngine> {
        Arc::clone(&self.engine)
    }

    pub fn progression(&self) -> Arc<ProgressionGraph> {
        Arc::clone(&self.progression)
    }
}

async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn StateStore>, StoreError> {
    let store: Arc<dyn StateStore> = match backend {
        StoreBackend::Memory => Arc::new(InMemoryStateStore::new()),
        StoreBackend::Sqlite { url } => Arc::new(SqliteStateStore::connect(url).await?),
        StoreBackend::SqliteFile { path } => Arc::new(SqliteStateStore::open_file(path).await?),
    };
    Ok(store)
}
