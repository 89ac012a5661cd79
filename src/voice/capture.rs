//! Audio capture from microphone

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use tokio::sync::{mpsc, oneshot};

use super::{SAMPLE_RATE, SpeakerOutput, Utterance, UtteranceSegmenter};
use crate::assistant::{AudioDevices, AudioInput, AudioOutput};
use crate::{Error, Result};

/// How often the capture thread drains the device buffer
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captures audio from the default input device
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device at 16kHz mono
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns error if capture fails
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    /// Samples captured since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Clear the audio buffer
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }
}

/// Microphone-backed [`AudioInput`]
///
/// The cpal stream is not `Send`, so capture and segmentation run on a
/// dedicated thread that hands finished utterances to the session.
pub struct MicrophoneInput {
    utterances: mpsc::Receiver<Vec<f32>>,
    paused: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl MicrophoneInput {
    /// Open the default microphone and start segmenting
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    pub async fn start() -> Result<Self> {
        let (tx, rx) = mpsc::channel(4);
        let (ready_tx, ready_rx) = oneshot::channel();
        let paused = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        let thread_paused = Arc::clone(&paused);
        let thread_running = Arc::clone(&running);

        std::thread::Builder::new()
            .name("sightline-mic".to_string())
            .spawn(move || capture_loop(&tx, ready_tx, &thread_paused, &thread_running))?;

        ready_rx
            .await
            .map_err(|_| Error::Audio("capture thread exited during startup".to_string()))??;

        Ok(Self {
            utterances: rx,
            paused,
            running,
        })
    }
}

impl Drop for MicrophoneInput {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioInput for MicrophoneInput {
    async fn next_utterance(&mut self, timeout: Duration) -> Result<Option<Utterance>> {
        match tokio::time::timeout(timeout, self.utterances.recv()).await {
            Ok(Some(samples)) => Ok(Some(Utterance::new(samples, SAMPLE_RATE))),
            Ok(None) => Err(Error::Audio("microphone capture stopped".to_string())),
            Err(_) => Ok(None),
        }
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
        if !paused {
            while self.utterances.try_recv().is_ok() {}
        }
    }
}

/// Default microphone and speaker
#[derive(Debug, Default)]
pub struct SystemAudio;

#[async_trait]
impl AudioDevices for SystemAudio {
    async fn open(&self) -> Result<(Box<dyn AudioInput>, Box<dyn AudioOutput>)> {
        let input = MicrophoneInput::start().await?;
        Ok((Box::new(input), Box::new(SpeakerOutput)))
    }
}

fn capture_loop(
    tx: &mpsc::Sender<Vec<f32>>,
    ready: oneshot::Sender<Result<()>>,
    paused: &AtomicBool,
    running: &AtomicBool,
) {
    let mut capture = match AudioCapture::new().and_then(|mut c| c.start().map(|()| c)) {
        Ok(capture) => {
            let _ = ready.send(Ok(()));
            capture
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut segmenter = UtteranceSegmenter::default();

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);

        if paused.load(Ordering::SeqCst) {
            capture.clear_buffer();
            segmenter.reset();
            continue;
        }

        let chunk = capture.take_buffer();
        if let Some(utterance) = segmenter.push(&chunk)
            && tx.blocking_send(utterance).is_err()
        {
            break;
        }
    }

    capture.stop();
    tracing::debug!("microphone thread exiting");
}
