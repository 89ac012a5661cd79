//! Sightline - Spoken scene description for low-vision users
//!
//! This library provides the core functionality for Sightline:
//! - Frame acquisition from a phone camera stream (JPEG or MJPEG over HTTP)
//! - Object detection with a YOLO model and left/center/right placement
//! - A voice assistant loop (listen, transcribe, dispatch, speak)
//! - Web search summaries and speech synthesis
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │       HTTP API       │      Assistant sessions       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Perception                           │
//! │   Camera  │  Detector  │  Direction  │  Summary     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │            External services                         │
//! │   STT  │  TTS  │  Web search  │  Model download     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod camera;
pub mod config;
pub mod daemon;
pub mod error;
pub mod perception;
pub mod search;
pub mod vision;
pub mod voice;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use perception::{PerceptionPipeline, PerceptionReport, PerceptionService};
pub use vision::{Detection, Direction};
