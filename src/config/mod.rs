//! Configuration management for Sightline
//!
//! Values are layered: built-in defaults, then the TOML file, then
//! environment variables. CLI flags are applied by the binary on top.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

use file::SightlineConfigFile;

/// Default YOLOv8n ONNX export
pub const DEFAULT_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.2.0/yolov8n.onnx";

/// Default allowed CORS origins
pub const DEFAULT_CORS_ORIGINS: &str = r"https://.*\.vercel\.app|http://localhost:3000";

/// Sightline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (models, cache)
    pub data_dir: PathBuf,

    /// Camera stream configuration
    pub camera: CameraConfig,

    /// Object detection model configuration
    pub model: ModelConfig,

    /// Perception pipeline configuration
    pub pipeline: PipelineConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP API server configuration
    pub server: ServerConfig,
}

/// Camera stream configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Stream URL configured at startup, if any
    pub initial_url: Option<String>,

    /// Port used when building a stream URL from a bare IP
    pub stream_port: u16,

    /// Path used when building a stream URL from a bare IP
    pub stream_path: String,

    /// Bound on establishing the connection
    pub connect_timeout: Duration,

    /// Bound on receiving one frame once connected
    pub read_timeout: Duration,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_url: None,
            stream_port: 8080,
            stream_path: "/video".to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// Object detection model configuration
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Local path of the ONNX model
    pub path: PathBuf,

    /// Where to download the model from when absent
    pub url: String,

    /// Detections below this confidence are discarded
    pub confidence_threshold: f32,

    /// IoU threshold for non-maximum suppression
    pub iou_threshold: f32,

    /// Square model input size
    pub input_size: u32,

    /// Maximum detections kept per frame
    pub max_detections: usize,
}

impl ModelConfig {
    fn with_data_dir(data_dir: &std::path::Path) -> Self {
        Self {
            path: data_dir.join("models").join("yolov8n.onnx"),
            url: DEFAULT_MODEL_URL.to_string(),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            input_size: 640,
            max_detections: 100,
        }
    }
}

/// Perception pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// End-to-end budget for fetch plus inference
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable microphone/speaker assistant sessions
    pub enabled: bool,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1", "eleven_monolingual_v1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// How long one listening turn waits for an utterance
    pub listen_timeout: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            listen_timeout: Duration::from_secs(8),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,

    /// Brave Search API key
    pub brave: Option<String>,

    /// Serper (Google) API key
    pub serper: Option<String>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Regex of allowed CORS origins
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 10000,
            cors_origins: DEFAULT_CORS_ORIGINS.to_string(),
        }
    }
}

/// Return the data directory, `~/.local/share/sightline` on Linux
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "sightline", "sightline")
        .map_or_else(|| PathBuf::from(".sightline"), |d| d.data_dir().to_path_buf())
}

impl Config {
    /// Load configuration from the config file and the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but malformed
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but malformed
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        let mut config = Self::from_sources(fc, |key| std::env::var(key).ok())?;

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
            config.voice.enabled = false;
        }

        std::fs::create_dir_all(&config.data_dir).ok();

        Ok(config)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// Environment values take precedence over file values.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric value cannot be parsed or is out of range
    pub fn from_sources<F>(fc: SightlineConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = env("SIGHTLINE_DATA_DIR").map_or_else(default_data_dir, PathBuf::from);

        // Camera
        let camera_defaults = CameraConfig::default();
        let camera = CameraConfig {
            initial_url: env("SIGHTLINE_CAMERA_URL").or(fc.camera.url),
            stream_port: fc.camera.stream_port.unwrap_or(camera_defaults.stream_port),
            stream_path: fc.camera.stream_path.unwrap_or(camera_defaults.stream_path),
            connect_timeout: secs(
                "camera.connect_timeout_secs",
                fc.camera.connect_timeout_secs,
                camera_defaults.connect_timeout,
            )?,
            read_timeout: secs(
                "camera.read_timeout_secs",
                fc.camera.read_timeout_secs,
                camera_defaults.read_timeout,
            )?,
        };

        // Model
        let model_defaults = ModelConfig::with_data_dir(&data_dir);
        let confidence_threshold = match env("SIGHTLINE_CONFIDENCE") {
            Some(raw) => parse("SIGHTLINE_CONFIDENCE", &raw)?,
            None => fc
                .model
                .confidence_threshold
                .unwrap_or(model_defaults.confidence_threshold),
        };
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence threshold must be within [0, 1], got {confidence_threshold}"
            )));
        }
        let model = ModelConfig {
            path: env("SIGHTLINE_MODEL_PATH")
                .or(fc.model.path)
                .map_or(model_defaults.path, PathBuf::from),
            url: env("SIGHTLINE_MODEL_URL")
                .or(fc.model.url)
                .unwrap_or(model_defaults.url),
            confidence_threshold,
            iou_threshold: fc.model.iou_threshold.unwrap_or(model_defaults.iou_threshold),
            input_size: fc.model.input_size.unwrap_or(model_defaults.input_size),
            max_detections: fc
                .model
                .max_detections
                .unwrap_or(model_defaults.max_detections),
        };

        // Pipeline
        let pipeline_timeout = match env("SIGHTLINE_PIPELINE_TIMEOUT_SECS") {
            Some(raw) => Some(parse::<f64>("SIGHTLINE_PIPELINE_TIMEOUT_SECS", &raw)?),
            None => fc.pipeline.timeout_secs,
        };
        let pipeline = PipelineConfig {
            timeout: secs(
                "pipeline.timeout_secs",
                pipeline_timeout,
                PipelineConfig::default().timeout,
            )?,
        };

        // Voice
        let voice_defaults = VoiceConfig::default();
        let listen_timeout = match env("SIGHTLINE_LISTEN_TIMEOUT_SECS") {
            Some(raw) => Some(parse::<f64>("SIGHTLINE_LISTEN_TIMEOUT_SECS", &raw)?),
            None => fc.voice.listen_timeout_secs,
        };
        let voice = VoiceConfig {
            enabled: fc.voice.enabled.unwrap_or(voice_defaults.enabled),
            stt_model: env("SIGHTLINE_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(voice_defaults.stt_model),
            tts_model: env("SIGHTLINE_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(voice_defaults.tts_model),
            tts_voice: env("SIGHTLINE_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(voice_defaults.tts_voice),
            tts_speed: fc.voice.tts_speed.unwrap_or(voice_defaults.tts_speed),
            listen_timeout: secs(
                "voice.listen_timeout_secs",
                listen_timeout,
                voice_defaults.listen_timeout,
            )?,
        };

        // API keys
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
            brave: env("BRAVE_API_KEY").or(fc.api_keys.brave),
            serper: env("SERPER_API_KEY").or(fc.api_keys.serper),
        };

        // API server
        let server_defaults = ServerConfig::default();
        let port = match env("SIGHTLINE_PORT").or_else(|| env("PORT")) {
            Some(raw) => parse("PORT", &raw)?,
            None => fc.server.port.unwrap_or(server_defaults.port),
        };
        let server = ServerConfig {
            port,
            cors_origins: env("SIGHTLINE_CORS_ORIGINS")
                .or(fc.server.cors_origins)
                .unwrap_or(server_defaults.cors_origins),
        };

        Ok(Self {
            data_dir,
            camera,
            model,
            pipeline,
            voice,
            api_keys,
            server,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("invalid value for {key}: {raw:?} ({e})")))
}

fn secs(key: &str, value: Option<f64>, default: Duration) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(v) if v.is_finite() && v > 0.0 => Ok(Duration::from_secs_f64(v)),
        Some(v) => Err(Error::Config(format!(
            "{key} must be a positive number of seconds, got {v}"
        ))),
    }
}
