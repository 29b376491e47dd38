//! Request handlers translating the HTTP contract into repository calls.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{Local, Utc};
use serde_json::json;

use super::AppState;
use crate::error::TaskError;
use crate::model::{ListFilter, NewTask, Task, TaskPatch};

/// Maps [`TaskError`] onto the HTTP contract: not-found answers 404,
/// everything else (validation included) answers 500 with the message in
/// the body.
pub(super) struct ApiError(TaskError);

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TaskError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub(super) async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub(super) async fn create_task(
    State(state): State<AppState>,
    Json(draft): Json<NewTask>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.store.create(&state.owner, draft)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub(super) async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.store.find_by_filter(&state.owner, &filter)?))
}

pub(super) async fn filter_today(
    State(state): State<AppState>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.store.due_today(&state.owner, &Local::now())?))
}

pub(super) async fn filter_overdue(
    State(state): State<AppState>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.store.overdue(&state.owner, &Utc::now())?))
}

pub(super) async fn filter_upcoming(
    State(state): State<AppState>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.store.upcoming(&state.owner, &Local::now())?))
}

pub(super) async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.store.find_by_id(&state.owner, &id)?))
}

pub(super) async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.store.update(&state.owner, &id, patch)?))
}

pub(super) async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.store.delete(&state.owner, &id)?;
    if removed == 0 {
        return Err(TaskError::NotFound(id).into());
    }
    Ok(Json(json!({ "message": "task deleted" })))
}
