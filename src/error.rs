//! Error types for Sightline

use std::time::Duration;

use thiserror::Error;

/// Result type alias for Sightline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Sightline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No camera endpoint has been configured yet
    #[error("no camera endpoint configured")]
    NotConfigured,

    /// Camera stream could not deliver a frame
    #[error("stream unavailable at {endpoint}: {cause}")]
    StreamUnavailable {
        /// Endpoint that was probed
        endpoint: String,
        /// What went wrong
        cause: String,
    },

    /// End-to-end perception budget exceeded
    #[error("perception timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// Detection model could not be fetched or loaded
    #[error("model provisioning error: {0}")]
    ModelProvisioning(String),

    /// Object model inference error
    #[error("inference error: {0}")]
    Inference(String),

    /// Speech could not be recognized
    #[error("unintelligible speech: {0}")]
    Unintelligible(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Web search error
    #[error("search error: {0}")]
    Search(String),

    /// Assistant session error
    #[error("session error: {0}")]
    Session(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Image decoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Build a [`Error::StreamUnavailable`] for an endpoint
    pub fn stream(endpoint: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::StreamUnavailable {
            endpoint: endpoint.into(),
            cause: cause.to_string(),
        }
    }

    /// Whether this error belongs to the perception path taxonomy
    #[must_use]
    pub const fn is_perception_failure(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured | Self::StreamUnavailable { .. } | Self::TimedOut(_)
        )
    }
}
