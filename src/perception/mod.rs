//! Perception pipeline
//!
//! One query fetches a fresh frame, runs detection off the async executor,
//! and tags every detection with its direction band. The whole sequence
//! runs under a single end-to-end timeout.

mod summary;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::camera::{EndpointStore, FrameSource};
use crate::vision::{Detection, Detector, Direction, direction};
use crate::{Error, Result};

pub use summary::{failure_notice, spoken_summary};

/// Default end-to-end budget for one perception query
pub const DEFAULT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(10);

/// Dimensions and capture time of the analysed frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

/// A detection with its direction band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectedDetection {
    #[serde(flatten)]
    pub detection: Detection,
    pub direction: Direction,
}

/// Result of one perception query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionReport {
    pub frame: FrameInfo,
    /// In detector order
    pub detections: Vec<DirectedDetection>,
}

impl PerceptionReport {
    /// Whether nothing was detected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Sentence describing the scene for speech output
    #[must_use]
    pub fn spoken_summary(&self) -> String {
        spoken_summary(&self.detections)
    }
}

/// Frame source → detector → direction classifier
#[derive(Clone)]
pub struct PerceptionPipeline {
    source: Arc<dyn FrameSource>,
    detector: Detector,
    timeout: Duration,
}

impl PerceptionPipeline {
    /// Create a pipeline with the given end-to-end timeout
    #[must_use]
    pub fn new(source: Arc<dyn FrameSource>, detector: Detector, timeout: Duration) -> Self {
        Self {
            source,
            detector,
            timeout,
        }
    }

    /// End-to-end budget
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one perception query against `endpoint`
    ///
    /// Invocations share nothing; concurrent calls each fetch their own frame.
    ///
    /// # Errors
    ///
    /// - [`Error::StreamUnavailable`] if no frame could be fetched
    /// - [`Error::TimedOut`] if fetch and inference exceed the budget
    /// - [`Error::Inference`] if the model fails
    pub async fn run(&self, endpoint: &str) -> Result<PerceptionReport> {
        let started = std::time::Instant::now();

        let report = tokio::time::timeout(self.timeout, self.run_inner(endpoint))
            .await
            .map_err(|_| {
                tracing::warn!(
                    endpoint,
                    timeout_ms = self.timeout.as_millis(),
                    "perception timed out"
                );
                Error::TimedOut(self.timeout)
            })??;

        tracing::info!(
            endpoint,
            detections = report.detections.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "perception complete"
        );

        Ok(report)
    }

    async fn run_inner(&self, endpoint: &str) -> Result<PerceptionReport> {
        let frame = self.source.fetch(endpoint).await?;

        let detector = self.detector.clone();
        let (frame, detections) = tokio::task::spawn_blocking(move || {
            let detections = detector.detect(&frame);
            (frame, detections)
        })
        .await
        .map_err(|e| Error::Inference(format!("detection task failed: {e}")))?;
        let detections = detections?;

        let width = frame.width();
        let detections = detections
            .into_iter()
            .map(|detection| DirectedDetection {
                direction: direction::classify(&detection, width),
                detection,
            })
            .collect();

        Ok(PerceptionReport {
            frame: FrameInfo {
                width,
                height: frame.height(),
                captured_at: frame.captured_at(),
            },
            detections,
        })
    }
}

/// Perception against the configured camera endpoint
#[derive(Clone)]
pub struct PerceptionService {
    endpoints: EndpointStore,
    pipeline: PerceptionPipeline,
}

impl PerceptionService {
    #[must_use]
    pub const fn new(endpoints: EndpointStore, pipeline: PerceptionPipeline) -> Self {
        Self {
            endpoints,
            pipeline,
        }
    }

    /// Endpoint store shared with the configuration surface
    #[must_use]
    pub const fn endpoints(&self) -> &EndpointStore {
        &self.endpoints
    }

    /// Run perception against the current endpoint
    ///
    /// The endpoint is read once; a concurrent reconfiguration does not affect
    /// a query already in flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] without touching the network if no
    /// endpoint is set, otherwise any [`PerceptionPipeline::run`] error
    pub async fn perceive(&self) -> Result<PerceptionReport> {
        let endpoint = self.endpoints.get()?;
        self.pipeline.run(&endpoint).await
    }
}
