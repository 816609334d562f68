mod courses;
mod health;
mod mastery;

use axum::http::Uri;
use axum::response::IntoResponse;
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(mastery::router())
        .merge(courses::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler(uri: Uri) -> impl IntoResponse {
    AppError::not_found(format!("no route for {}", uri.path()))
}
