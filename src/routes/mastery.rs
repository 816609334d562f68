use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::mastery::{AttemptEvent, ZpdBand};
use crate::response::{ok, AppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotQuery {
    student_id: String,
    skill_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DifficultyRequest {
    #[serde(default)]
    student_id: Option<String>,
    skill_id: String,
    #[serde(default)]
    zpd_status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bkt/snapshot", get(snapshot))
        .route("/answers", post(submit_answer))
        .route("/difficulty", post(select_difficulty))
}

async fn snapshot(
    State(state): State<AppState>,
    query: Result<Query<SnapshotQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let snapshot = state
        .engine()
        .snapshot(&query.student_id, &query.skill_id)
        .await?;
    Ok(ok(snapshot))
}

async fn submit_answer(
    State(state): State<AppState>,
    payload: Result<Json<AttemptEvent>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(event) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    let snapshot = state.engine().submit_attempt(&event).await?;
    Ok(ok(snapshot))
}

async fn select_difficulty(
    State(state): State<AppState>,
    payload: Result<Json<DifficultyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    if request.skill_id.trim().is_empty() {
        return Err(AppError::validation("skillId is required"));
    }
    let explicit = match request.zpd_status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(
            ZpdBand::parse(raw)
                .ok_or_else(|| AppError::validation(format!("unknown zpdStatus: {raw}")))?,
        ),
        None => None,
    };

    let selection = state
        .engine()
        .select_difficulty(request.student_id.as_deref(), request.skill_id.trim(), explicit)
        .await?;
    Ok(ok(selection))
}
