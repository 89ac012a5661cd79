//! JSON error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// API errors
#[derive(Debug)]
pub enum ApiError {
    /// A capability is not available in this deployment
    NotConfigured(&'static str),
    BadRequest(String),
    NotFound(String),
    /// Error from the core, mapped by kind
    Core(Error),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::Core(error)
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            Self::NotConfigured(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_configured",
                msg.to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Core(error) => {
                let (status, code) = match &error {
                    Error::NotConfigured => (StatusCode::CONFLICT, "camera_not_configured"),
                    Error::StreamUnavailable { .. } => {
                        (StatusCode::BAD_GATEWAY, "stream_unavailable")
                    }
                    Error::TimedOut(_) => (StatusCode::GATEWAY_TIMEOUT, "timed_out"),
                    Error::Config(_) => (StatusCode::BAD_REQUEST, "bad_request"),
                    Error::Session(_) => (StatusCode::NOT_FOUND, "not_found"),
                    Error::Unintelligible(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "unintelligible")
                    }
                    Error::Tts(_) | Error::Search(_) | Error::Stt(_) | Error::Http(_) => {
                        (StatusCode::BAD_GATEWAY, "upstream_failed")
                    }
                    Error::Audio(_) => (StatusCode::SERVICE_UNAVAILABLE, "audio_unavailable"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
                };
                (status, code, error.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::warn!(%status, code, message = %message, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn perception_failures_map_to_distinct_statuses() {
        assert_eq!(
            ApiError::from(Error::NotConfigured).parts().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(Error::stream("http://cam", "refused")).parts().0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(Error::TimedOut(Duration::from_secs(10)))
                .parts()
                .0,
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
