//! TOML configuration file loading
//!
//! Supports `~/.config/sightline/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SightlineConfigFile {
    /// Camera stream configuration
    #[serde(default)]
    pub camera: CameraFileConfig,

    /// Object detection model configuration
    #[serde(default)]
    pub model: ModelFileConfig,

    /// Perception pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Camera stream configuration
#[derive(Debug, Default, Deserialize)]
pub struct CameraFileConfig {
    /// Stream URL to use at startup
    pub url: Option<String>,

    /// Port appended when the camera is configured by IP
    pub stream_port: Option<u16>,

    /// Path appended when the camera is configured by IP
    pub stream_path: Option<String>,

    /// Connect timeout in seconds
    pub connect_timeout_secs: Option<f64>,

    /// Read timeout in seconds
    pub read_timeout_secs: Option<f64>,
}

/// Object detection model configuration
#[derive(Debug, Default, Deserialize)]
pub struct ModelFileConfig {
    /// Local model path
    pub path: Option<String>,

    /// Download URL used when the model is absent
    pub url: Option<String>,

    /// Minimum confidence for a detection to be reported
    pub confidence_threshold: Option<f32>,

    /// IoU threshold for non-maximum suppression
    pub iou_threshold: Option<f32>,

    /// Square model input size in pixels
    pub input_size: Option<u32>,

    /// Maximum detections per frame
    pub max_detections: Option<usize>,
}

/// Perception pipeline configuration
#[derive(Debug, Default, Deserialize)]
pub struct PipelineFileConfig {
    /// End-to-end timeout in seconds
    pub timeout_secs: Option<f64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Seconds to wait for an utterance before listening again
    pub listen_timeout_secs: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
    pub brave: Option<String>,
    pub serper: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Regex of allowed CORS origins
    pub cors_origins: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SightlineConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> SightlineConfigFile {
    let Some(path) = config_file_path() else {
        return SightlineConfigFile::default();
    };

    if !path.exists() {
        return SightlineConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SightlineConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SightlineConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/sightline/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    std::env::var("SIGHTLINE_CONFIG")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            directories::BaseDirs::new()
                .map(|d| d.config_dir().join("sightline").join("config.toml"))
        })
}
