//! Shared test utilities
//!
//! Scripted stand-ins for the camera, the model, and the voice providers so
//! integration tests run without hardware or network access.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use tokio::net::TcpListener;

use sightline::assistant::{
    AudioDevices, AudioInput, AudioOutput, Capabilities, Perceiver, Searcher, Synthesizer,
    Transcriber,
};
use sightline::camera::{EndpointStore, Frame, FrameSource};
use sightline::perception::{PerceptionPipeline, PerceptionService};
use sightline::vision::{BoundingBox, Detection, Detector, ObjectModel};
use sightline::voice::{SAMPLE_RATE, Utterance};
use sightline::{Error, Result};

/// Encode a solid-color JPEG
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, image::Rgb([90, 120, 150]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Jpeg)
        .expect("failed to encode test jpeg");
    out.into_inner()
}

/// Serve `router` on an ephemeral local port
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Model that returns the same detections for every frame
pub struct FixedModel(pub Vec<Detection>);

impl ObjectModel for FixedModel {
    fn name(&self) -> &str {
        "fixed"
    }

    fn infer(&self, _frame: &Frame) -> Result<Vec<Detection>> {
        Ok(self.0.clone())
    }
}

/// A person near the left edge of any frame at least 300 pixels wide
pub fn person_on_left() -> Vec<Detection> {
    vec![Detection::new(
        "person",
        0.91,
        BoundingBox::new(10.0, 20.0, 50.0, 180.0),
    )]
}

/// Frame source that hands out one in-memory frame and counts fetches
pub struct StaticSource {
    width: u32,
    height: u32,
    delay: Duration,
    pub fetches: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            delay: Duration::ZERO,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetches.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl FrameSource for StaticSource {
    async fn fetch(&self, endpoint: &str) -> Result<Frame> {
        self.fetches
            .lock()
            .expect("poisoned")
            .push(endpoint.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Frame::new(RgbImage::new(self.width, self.height)))
    }
}

/// Perception service over a fake source and model
pub fn perception(
    source: Arc<dyn FrameSource>,
    detections: Vec<Detection>,
    timeout: Duration,
) -> PerceptionService {
    let detector = Detector::with_default_threshold(Arc::new(FixedModel(detections)));
    let pipeline = PerceptionPipeline::new(source, detector, timeout);
    PerceptionService::new(EndpointStore::default(), pipeline)
}

/// One step of a scripted microphone
#[derive(Debug, Clone)]
pub enum Heard {
    /// A listening window with no speech
    Silence,
    /// An utterance; the tag ends up as its sample count
    Speech(usize),
    /// Device failure
    Failure,
}

/// Scripted [`AudioInput`]; once the script runs out it stays silent
pub struct ScriptedInput {
    script: VecDeque<Heard>,
    pub pauses: Arc<Mutex<Vec<bool>>>,
}

impl ScriptedInput {
    pub fn new(script: impl IntoIterator<Item = Heard>) -> Self {
        Self {
            script: script.into_iter().collect(),
            pauses: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AudioInput for ScriptedInput {
    async fn next_utterance(&mut self, timeout: Duration) -> Result<Option<Utterance>> {
        match self.script.pop_front() {
            Some(Heard::Silence) => Ok(None),
            Some(Heard::Speech(tag)) => Ok(Some(Utterance::new(vec![0.1; tag], SAMPLE_RATE))),
            Some(Heard::Failure) => Err(Error::Audio("device unplugged".to_string())),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }

    fn set_paused(&mut self, paused: bool) {
        self.pauses.lock().expect("poisoned").push(paused);
    }
}

/// [`AudioOutput`] that records what it was asked to play
#[derive(Clone, Default)]
pub struct RecordingOutput {
    pub played: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl AudioOutput for RecordingOutput {
    async fn play(&mut self, audio: Vec<u8>) -> Result<()> {
        self.played.lock().expect("poisoned").push(audio);
        Ok(())
    }
}

/// Transcriber keyed on utterance length; unknown lengths are unintelligible
pub struct ScriptedTranscriber {
    phrases: Vec<(usize, String)>,
}

impl ScriptedTranscriber {
    pub fn new(phrases: &[(usize, &str)]) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|(tag, text)| (*tag, (*text).to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, utterance: &Utterance) -> Result<String> {
        let tag = utterance.samples.len();
        self.phrases
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| Error::Unintelligible("no speech detected".to_string()))
    }
}

/// Synthesizer whose "audio" is the UTF-8 text, recording every line
#[derive(Clone, Default)]
pub struct TextSynthesizer {
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl TextSynthesizer {
    pub fn lines(&self) -> Vec<String> {
        self.spoken.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl Synthesizer for TextSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.spoken.lock().expect("poisoned").push(text.to_string());
        Ok(text.as_bytes().to_vec())
    }
}

/// Searcher with a canned answer
pub struct CannedSearcher(pub &'static str);

#[async_trait]
impl Searcher for CannedSearcher {
    async fn summarize(&self, query: &str) -> Result<String> {
        Ok(format!("{} ({query})", self.0))
    }
}

/// Devices that give every session a fresh copy of the same script
pub struct ScriptedDevices {
    pub script: Vec<Heard>,
    pub output: RecordingOutput,
}

#[async_trait]
impl AudioDevices for ScriptedDevices {
    async fn open(&self) -> Result<(Box<dyn AudioInput>, Box<dyn AudioOutput>)> {
        Ok((
            Box::new(ScriptedInput::new(self.script.clone())),
            Box::new(self.output.clone()),
        ))
    }
}

/// Capabilities over the given perceiver with scripted speech
pub fn capabilities(
    phrases: &[(usize, &str)],
    perceiver: Arc<dyn Perceiver>,
    synthesizer: &TextSynthesizer,
) -> Capabilities {
    Capabilities {
        transcriber: Arc::new(ScriptedTranscriber::new(phrases)),
        synthesizer: Arc::new(synthesizer.clone()),
        perceiver,
        searcher: Some(Arc::new(CannedSearcher("Rust is a language"))),
    }
}

/// Poll `check` until it holds or `within` elapses
pub async fn eventually(within: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
