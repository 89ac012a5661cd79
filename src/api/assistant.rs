//! Assistant session control

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use uuid::Uuid;

use super::{ApiError, ApiState};
use crate::assistant::{SessionManager, SessionStatus};

/// Build assistant router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/sessions", get(list_sessions).post(start_session))
        .route("/sessions/{id}", get(session_status).delete(stop_session))
        // Older clients start listening with a plain GET
        .route("/listen", get(start_session))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct SessionStarted {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub status: SessionStatus,
}

fn manager(state: &ApiState) -> Result<&Arc<SessionManager>, ApiError> {
    state
        .sessions
        .as_ref()
        .ok_or(ApiError::NotConfigured("voice assistant is disabled"))
}

async fn start_session(
    State(state): State<Arc<ApiState>>,
) -> Result<(StatusCode, Json<SessionStarted>), ApiError> {
    let session_id = manager(&state)?.start().await?;
    Ok((StatusCode::CREATED, Json(SessionStarted { session_id })))
}

async fn list_sessions(State(state): State<Arc<ApiState>>) -> Result<Json<SessionList>, ApiError> {
    let sessions = manager(&state)?.list().await;
    Ok(Json(SessionList { sessions }))
}

async fn session_status(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let status = manager(&state)?
        .status(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no session {id}")))?;
    Ok(Json(SessionView {
        session_id: id,
        status,
    }))
}

async fn stop_session(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let status = manager(&state)?.stop(id).await?;
    Ok(Json(SessionView {
        session_id: id,
        status,
    }))
}
