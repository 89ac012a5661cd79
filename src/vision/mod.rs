//! Object detection and spatial bucketing
//!
//! Provides:
//! - Backend-agnostic [`Detector`] over an [`ObjectModel`]
//! - YOLOv8 ONNX backend (`onnx` feature)
//! - Left / center / right direction bands
//! - First-run model provisioning

mod detection;
mod detector;
pub mod direction;
pub mod labels;
pub mod postprocess;
mod provision;
#[cfg(feature = "onnx")]
mod yolo;

use std::sync::Arc;

pub use detection::{BoundingBox, Detection};
pub use detector::{DEFAULT_CONFIDENCE_THRESHOLD, Detector, ObjectModel};
pub use direction::{Direction, classify};
pub use provision::ensure_model;
#[cfg(feature = "onnx")]
pub use yolo::{YoloModel, YoloParams};

use crate::Result;
use crate::config::ModelConfig;

/// Load the configured object model from disk
///
/// # Errors
///
/// Returns [`crate::Error::ModelProvisioning`] if the model cannot be loaded,
/// or if the binary was built without an inference backend
#[cfg(feature = "onnx")]
pub fn load_model(config: &ModelConfig) -> Result<Arc<dyn ObjectModel>> {
    let model = YoloModel::load(&config.path, YoloParams::from(config))?;
    Ok(Arc::new(model))
}

/// Load the configured object model from disk
///
/// # Errors
///
/// Always fails: built without the `onnx` feature
#[cfg(not(feature = "onnx"))]
pub fn load_model(config: &ModelConfig) -> Result<Arc<dyn ObjectModel>> {
    Err(crate::Error::ModelProvisioning(format!(
        "cannot load {}: built without the onnx feature",
        config.path.display()
    )))
}
