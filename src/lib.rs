pub mod config;
pub mod logging;
pub mod mastery;
pub mod progression;
pub mod response;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::mastery::EngineConfig;
use crate::progression::{CatalogError, CourseCatalog};
use crate::state::AppState;

pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// In-memory app over the bundled catalog.
pub fn create_app() -> Result<axum::Router, CatalogError> {
    let state = AppState::in_memory(EngineConfig::default(), CourseCatalog::builtin()?);
    Ok(build_app(state))
}
