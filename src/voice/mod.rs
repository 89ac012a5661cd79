//! Voice processing module
//!
//! Handles utterance segmentation, speech-to-text, text-to-speech, and,
//! with the `audio` feature, microphone capture and speaker playback.

#[cfg(feature = "audio")]
mod capture;
#[cfg(feature = "audio")]
mod playback;
mod segmenter;
mod stt;
mod tts;
mod wav;

#[cfg(feature = "audio")]
pub use capture::{AudioCapture, MicrophoneInput, SystemAudio};
#[cfg(feature = "audio")]
pub use playback::{AudioPlayback, SpeakerOutput};
pub use segmenter::{MAX_UTTERANCE_SAMPLES, UtteranceSegmenter};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use wav::samples_to_wav;

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// A contiguous segment of captured speech bounded by silence
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Utterance {
    #[must_use]
    pub const fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Encode as 16-bit mono WAV
    ///
    /// # Errors
    ///
    /// Returns error if WAV encoding fails
    pub fn to_wav(&self) -> crate::Result<Vec<u8>> {
        samples_to_wav(&self.samples, self.sample_rate)
    }
}
