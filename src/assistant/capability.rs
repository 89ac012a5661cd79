//! Capabilities the assistant loop calls into
//!
//! Each seam is a trait so sessions can run against real hardware and
//! providers or against scripted fakes.

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::perception::{PerceptionReport, PerceptionService};
use crate::voice::Utterance;

/// Source of segmented utterances
#[async_trait]
pub trait AudioInput: Send {
    /// Wait for the next complete utterance
    ///
    /// Returns `Ok(None)` if nothing was said within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the capture device is gone
    async fn next_utterance(&mut self, timeout: Duration) -> Result<Option<Utterance>>;

    /// Stop hearing while the assistant speaks
    ///
    /// Resuming discards anything captured while paused.
    fn set_paused(&mut self, _paused: bool) {}
}

/// Sink for synthesized speech
#[async_trait]
pub trait AudioOutput: Send {
    /// Play encoded audio, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    async fn play(&mut self, audio: Vec<u8>) -> Result<()>;
}

/// Speech-to-text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one utterance
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unintelligible`] if no words were recognized
    async fn transcribe(&self, utterance: &Utterance) -> Result<String>;
}

/// Text-to-speech
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render text to encoded audio
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Web search condensed for speech
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Summarize results for `query`
    ///
    /// # Errors
    ///
    /// Returns error if the search provider fails
    async fn summarize(&self, query: &str) -> Result<String>;
}

/// Scene perception
#[async_trait]
pub trait Perceiver: Send + Sync {
    /// Look at the current camera frame
    ///
    /// # Errors
    ///
    /// Returns any perception failure unchanged
    async fn perceive(&self) -> Result<PerceptionReport>;
}

#[async_trait]
impl Perceiver for PerceptionService {
    async fn perceive(&self) -> Result<PerceptionReport> {
        Self::perceive(self).await
    }
}

/// Opens the audio pair a new session listens and speaks through
#[async_trait]
pub trait AudioDevices: Send + Sync {
    /// Open input and output for one session
    ///
    /// # Errors
    ///
    /// Returns error if a device is unavailable
    async fn open(&self) -> Result<(Box<dyn AudioInput>, Box<dyn AudioOutput>)>;
}
