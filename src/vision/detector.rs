//! Object detector
//!
//! The [`ObjectModel`] trait decouples the detector from any specific
//! backend. The model is loaded once and handed to the [`Detector`] at
//! construction; the detector owns only the thresholding step.

use std::sync::Arc;

use super::Detection;
use crate::Result;
use crate::camera::Frame;

/// Default minimum confidence for a reported detection
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Contract for object detection backends
pub trait ObjectModel: Send + Sync + 'static {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Run inference on one frame
    ///
    /// Returns raw candidates with boxes in frame pixels. Must be
    /// deterministic for identical input.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails to run
    fn infer(&self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Thresholds and sanitizes model output for one frame
#[derive(Clone)]
pub struct Detector {
    model: Arc<dyn ObjectModel>,
    confidence_threshold: f32,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("model", &self.model.name())
            .field("confidence_threshold", &self.confidence_threshold)
            .finish()
    }
}

impl Detector {
    /// Create a detector over a loaded model
    #[must_use]
    pub fn new(model: Arc<dyn ObjectModel>, confidence_threshold: f32) -> Self {
        Self {
            model,
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
        }
    }

    /// Create a detector with the default threshold
    #[must_use]
    pub fn with_default_threshold(model: Arc<dyn ObjectModel>) -> Self {
        Self::new(model, DEFAULT_CONFIDENCE_THRESHOLD)
    }

    /// Confidence threshold in use
    #[must_use]
    pub const fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Detect objects in a frame
    ///
    /// Candidates below the threshold, with non-finite scores, or whose box
    /// is empty once clamped to the frame are discarded. Order is preserved.
    ///
    /// # Errors
    ///
    /// Returns error only if the model itself fails
    #[allow(clippy::cast_precision_loss)]
    pub fn detect(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let width = frame.width() as f32;
        let height = frame.height() as f32;

        let raw = self.model.infer(frame)?;
        let raw_count = raw.len();

        let detections: Vec<Detection> = raw
            .into_iter()
            .filter(|d| d.confidence.is_finite() && d.confidence >= self.confidence_threshold)
            .filter_map(|d| {
                let bbox = d.bbox.clamped(width, height);
                bbox.is_valid().then(|| Detection {
                    confidence: d.confidence.min(1.0),
                    bbox,
                    label: d.label,
                })
            })
            .collect();

        tracing::debug!(
            model = self.model.name(),
            candidates = raw_count,
            kept = detections.len(),
            threshold = self.confidence_threshold,
            "detection complete"
        );

        Ok(detections)
    }
}
