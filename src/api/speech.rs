//! Search and speech synthesis endpoints

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};

/// Build speech router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/speak", post(speak))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SearchSummary {
    pub query: String,
    pub summary: String,
}

async fn search(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchSummary>, ApiError> {
    let searcher = state
        .searcher
        .as_ref()
        .ok_or(ApiError::NotConfigured("search not configured (no Brave or Serper key)"))?;

    let query = form.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("empty query".to_string()));
    }

    let summary = searcher.summarize(query).await?;
    Ok(Json(SearchSummary {
        query: query.to_string(),
        summary,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SpeakForm {
    pub text: String,
}

/// Returns MP3 audio
async fn speak(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<SpeakForm>,
) -> Result<Response, ApiError> {
    let synthesizer = state
        .synthesizer
        .as_ref()
        .ok_or(ApiError::NotConfigured("TTS not configured (no OpenAI or ElevenLabs key)"))?;

    if form.text.trim().is_empty() {
        return Err(ApiError::BadRequest("empty text".to_string()));
    }

    let audio = synthesizer.synthesize(&form.text).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"output.mp3\"",
            ),
        ],
        audio,
    )
        .into_response())
}
