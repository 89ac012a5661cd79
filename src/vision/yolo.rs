//! YOLOv8 ONNX backend via the `ort` crate.
//!
//! Targets the Ultralytics ONNX export:
//! - input  `images`  `[1, 3, S, S]`, RGB scaled to `[0, 1]`
//! - output `output0` `[1, 4 + C, N]`, rows `cx, cy, w, h, score_0 .. score_C`
//!
//! Frames are letterboxed to `S × S`; boxes are mapped back to frame pixels
//! and suppressed class-wise before being handed to the detector.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::Value;

use super::postprocess::{self, Letterbox};
use super::{Detection, ObjectModel};
use crate::camera::Frame;
use crate::config::ModelConfig;
use crate::{Error, Result};

const INPUT_NAME: &str = "images";
const OUTPUT_NAME: &str = "output0";

/// Candidates below this never reach suppression
const MIN_CANDIDATE_SCORE: f32 = 0.01;

/// Tuning for the YOLO decoder
#[derive(Debug, Clone, Copy)]
pub struct YoloParams {
    pub input_size: u32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}

impl From<&ModelConfig> for YoloParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            input_size: config.input_size,
            iou_threshold: config.iou_threshold,
            max_detections: config.max_detections,
        }
    }
}

/// YOLOv8 object model backed by an ONNX Runtime session
pub struct YoloModel {
    session: Mutex<Session>,
    params: YoloParams,
}

impl YoloModel {
    /// Load the model from disk
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelProvisioning`] if the file is missing or not a valid model
    pub fn load(path: &Path, params: YoloParams) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ModelProvisioning(format!(
                "model not found at {}",
                path.display()
            )));
        }

        let threads = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
            .clamp(1, 4);

        let session = SessionBuilder::new()
            .map_err(|e| Error::ModelProvisioning(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::All)
            .map_err(|e| Error::ModelProvisioning(e.to_string()))?
            .with_intra_threads(threads)
            .map_err(|e| Error::ModelProvisioning(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| Error::ModelProvisioning(e.to_string()))?;

        tracing::info!(
            path = %path.display(),
            input_size = params.input_size,
            threads,
            "YOLO model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            params,
        })
    }

    /// Decoder parameters
    #[must_use]
    pub const fn params(&self) -> YoloParams {
        self.params
    }
}

impl ObjectModel for YoloModel {
    fn name(&self) -> &str {
        "yolov8"
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn infer(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let size = self.params.input_size;
        let letterbox = Letterbox::new(frame.width(), frame.height(), size);
        let input = letterbox.apply(frame.image());

        let side = size as usize;
        let tensor = Array4::from_shape_vec((1, 3, side, side), postprocess::to_chw(&input))
            .map_err(|e| Error::Inference(e.to_string()))?;
        let value = Value::from_array(tensor)
            .map_err(|e: ort::Error| Error::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("model session poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![INPUT_NAME => value])
            .map_err(|e| Error::Inference(e.to_string()))?;

        let (shape, data) = outputs[OUTPUT_NAME]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(e.to_string()))?;

        if shape.len() != 3 {
            return Err(Error::Inference(format!(
                "unexpected output rank {}",
                shape.len()
            )));
        }
        let channels = shape[1] as usize;
        let anchors = shape[2] as usize;

        let candidates =
            postprocess::decode_output(data, channels, anchors, &letterbox, MIN_CANDIDATE_SCORE);
        let kept = postprocess::non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        );

        Ok(postprocess::into_detections(kept))
    }
}
