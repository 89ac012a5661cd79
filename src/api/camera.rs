//! Camera endpoint configuration and perception queries

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::perception::PerceptionReport;

/// Build camera router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/set_camera_url", post(set_camera_url))
        .route("/camera_url", get(camera_url))
        .route("/detect_objects", get(detect_objects))
        .with_state(state)
}

/// Either a bare phone IP or a full stream URL
#[derive(Debug, Deserialize)]
pub struct SetCameraForm {
    pub ip: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CameraConnected {
    pub message: &'static str,
    pub stream_url: String,
}

async fn set_camera_url(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<SetCameraForm>,
) -> Result<Json<CameraConnected>, ApiError> {
    let endpoints = state.perception.endpoints();

    let stream_url = match (form.url, form.ip) {
        (Some(url), _) if !url.trim().is_empty() => endpoints.set(url.trim())?,
        (_, Some(ip)) => endpoints.set_from_ip(ip.trim())?,
        _ => return Err(ApiError::BadRequest("ip or url is required".to_string())),
    };

    Ok(Json(CameraConnected {
        message: "Camera connected",
        stream_url,
    }))
}

#[derive(Debug, Serialize)]
pub struct CameraUrl {
    pub stream_url: Option<String>,
}

async fn camera_url(State(state): State<Arc<ApiState>>) -> Json<CameraUrl> {
    Json(CameraUrl {
        stream_url: state.perception.endpoints().get().ok(),
    })
}

async fn detect_objects(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<PerceptionReport>, ApiError> {
    let report = state.perception.perceive().await?;
    Ok(Json(report))
}
