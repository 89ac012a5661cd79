//! Energy-based utterance segmentation
//!
//! Splits a continuous microphone stream into utterances: speech starts when
//! a chunk's RMS energy crosses the threshold and ends after a run of
//! trailing silence.

use super::SAMPLE_RATE;

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to emit (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 3 / 10; // 0.3 seconds

/// Silence duration to consider end of utterance (in samples)
const SILENCE_SAMPLES: usize = SAMPLE_RATE as usize / 2; // 0.5 seconds

/// Longest utterance before it is cut off (in samples)
pub const MAX_UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize * 15; // 15 seconds

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Speaking,
}

/// Accumulates audio chunks into complete utterances
#[derive(Debug)]
pub struct UtteranceSegmenter {
    phase: Phase,
    buffer: Vec<f32>,
    speech_samples: usize,
    silence_samples: usize,
    energy_threshold: f32,
}

impl Default for UtteranceSegmenter {
    fn default() -> Self {
        Self::new(ENERGY_THRESHOLD)
    }
}

impl UtteranceSegmenter {
    #[must_use]
    pub const fn new(energy_threshold: f32) -> Self {
        Self {
            phase: Phase::Waiting,
            buffer: Vec::new(),
            speech_samples: 0,
            silence_samples: 0,
            energy_threshold,
        }
    }

    /// Feed one chunk of audio
    ///
    /// Returns the finished utterance once enough speech has been followed
    /// by enough silence, or once it reaches [`MAX_UTTERANCE_SAMPLES`] so
    /// constant background noise still yields something to transcribe.
    /// Short noise bursts are dropped.
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        if samples.is_empty() {
            return None;
        }

        let energy = rms(samples);
        let is_speech = energy > self.energy_threshold;

        match self.phase {
            Phase::Waiting => {
                if is_speech {
                    self.phase = Phase::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_samples = 0;
                    tracing::trace!(energy, "speech started");
                }
                None
            }
            Phase::Speaking => {
                self.buffer.extend_from_slice(samples);

                if self.buffer.len() >= MAX_UTTERANCE_SAMPLES {
                    let utterance = std::mem::take(&mut self.buffer);
                    tracing::debug!(samples = utterance.len(), "utterance cut at maximum length");
                    self.reset();
                    return Some(utterance);
                }

                if is_speech {
                    self.speech_samples += samples.len();
                    self.silence_samples = 0;
                    return None;
                }

                self.silence_samples += samples.len();
                if self.silence_samples < SILENCE_SAMPLES {
                    return None;
                }

                if self.speech_samples < MIN_SPEECH_SAMPLES {
                    tracing::trace!(samples = self.speech_samples, "discarding noise burst");
                    self.reset();
                    return None;
                }

                let utterance = std::mem::take(&mut self.buffer);
                tracing::debug!(samples = utterance.len(), "utterance complete");
                self.reset();
                Some(utterance)
            }
        }
    }

    /// Whether speech is currently being accumulated
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.phase == Phase::Speaking
    }

    /// Drop any partial utterance
    pub fn reset(&mut self) {
        self.phase = Phase::Waiting;
        self.buffer.clear();
        self.speech_samples = 0;
        self.silence_samples = 0;
    }
}

/// RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
