use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::response::{ok, AppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentQuery {
    student_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/assignments", get(list_assignments))
        .route("/progression", get(progression_report))
}

fn student_id(query: Result<Query<StudentQuery>, QueryRejection>) -> Result<String, AppError> {
    let Query(query) = query.map_err(|e| AppError::validation(e.body_text()))?;
    Ok(query.student_id)
}

async fn list_courses(
    State(state): State<AppState>,
    query: Result<Query<StudentQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = student_id(query)?;
    let courses = state.progression().compute_enrollments(&student_id).await?;
    Ok(ok(courses))
}

async fn list_assignments(
    State(state): State<AppState>,
    query: Result<Query<StudentQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = student_id(query)?;
    let assignments = state.progression().compute_assignments(&student_id).await?;
    Ok(ok(assignments))
}

async fn progression_report(
    State(state): State<AppState>,
    query: Result<Query<StudentQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = student_id(query)?;
    let report = state.progression().sync(&student_id).await?;
    Ok(ok(report))
}
