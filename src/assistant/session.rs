//! Assistant sessions
//!
//! A session is a task running the listen / recognize / dispatch / speak
//! cycle until it is told to stop. Stop requests are checked while waiting
//! for speech and between cycles; a cycle already recognizing or speaking
//! runs to completion first.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{
    AssistantState, AudioDevices, AudioInput, AudioOutput, Intent, Perceiver, Searcher,
    SessionStatus, Synthesizer, Transcriber,
};
use crate::perception::failure_notice;
use crate::{Error, Result};

/// Default time to wait for an utterance before listening again
pub const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_secs(8);

/// Pause after an input device failure before listening again
const INPUT_RETRY_DELAY: Duration = Duration::from_secs(1);

const DIDNT_CATCH_THAT: &str = "Sorry, I didn't catch that.";
const SEARCH_UNAVAILABLE: &str = "Search isn't available right now.";
const SEARCH_FAILED: &str = "I couldn't search for that right now.";
const FAREWELL: &str = "Goodbye.";

/// Shared services a session dispatches to
#[derive(Clone)]
pub struct Capabilities {
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub perceiver: Arc<dyn Perceiver>,
    pub searcher: Option<Arc<dyn Searcher>>,
}

/// One running assistant loop
struct Session {
    input: Box<dyn AudioInput>,
    output: Box<dyn AudioOutput>,
    caps: Capabilities,
    listen_timeout: Duration,
    status: watch::Sender<SessionStatus>,
    stop: watch::Receiver<bool>,
}

impl Session {
    fn set_state(&self, state: AssistantState) {
        self.status.send_modify(|s| s.state = state);
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    async fn run(mut self) {
        tracing::info!("assistant session started");

        while !self.stop_requested() {
            self.set_state(AssistantState::Listening);

            let heard = tokio::select! {
                () = stopped(self.stop.clone()) => break,
                heard = self.input.next_utterance(self.listen_timeout) => heard,
            };

            let utterance = match heard {
                Ok(Some(utterance)) => utterance,
                Ok(None) => {
                    tracing::trace!("listening window closed without speech");
                    self.status.send_modify(|s| s.silent_windows += 1);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "audio input failed");
                    self.set_state(AssistantState::Error);
                    tokio::select! {
                        () = stopped(self.stop.clone()) => break,
                        () = tokio::time::sleep(INPUT_RETRY_DELAY) => continue,
                    }
                }
            };

            self.set_state(AssistantState::Recognizing);
            let transcript = match self.caps.transcriber.transcribe(&utterance).await {
                Ok(text) => text,
                Err(e) => {
                    if matches!(e, Error::Unintelligible(_)) {
                        tracing::debug!(error = %e, "utterance not understood");
                    } else {
                        tracing::warn!(error = %e, "transcription failed");
                    }
                    self.status.send_modify(|s| {
                        s.state = AssistantState::Error;
                        s.recognition_failures += 1;
                    });
                    self.speak(DIDNT_CATCH_THAT).await;
                    continue;
                }
            };

            self.status.send_modify(|s| {
                s.state = AssistantState::Dispatching;
                s.last_transcript = Some(transcript.clone());
            });

            let intent = Intent::parse(&transcript);
            tracing::info!(transcript = %transcript, intent = ?intent, "dispatching command");

            let finished = intent == Intent::Stop;
            let response = dispatch(&self.caps, intent).await;

            self.speak(&response).await;
            self.status.send_modify(|s| s.cycles += 1);

            if finished {
                break;
            }
        }

        self.set_state(AssistantState::Idle);
        tracing::info!("assistant session ended");
    }

    /// Say `text`, keeping the microphone closed until playback ends
    async fn speak(&mut self, text: &str) {
        self.status.send_modify(|s| {
            s.state = AssistantState::Speaking;
            s.last_response = Some(text.to_string());
        });

        self.input.set_paused(true);

        let spoken = match self.caps.synthesizer.synthesize(text).await {
            Ok(audio) => self.output.play(audio).await,
            Err(e) => Err(e),
        };
        if let Err(e) = spoken {
            tracing::warn!(error = %e, text, "failed to speak response");
        }

        self.input.set_paused(false);
    }
}

/// Resolves once a stop is requested or the handle is gone
async fn stopped(mut stop: watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Run the capability an intent asks for and phrase the result
async fn dispatch(caps: &Capabilities, intent: Intent) -> String {
    match intent {
        Intent::Describe => match caps.perceiver.perceive().await {
            Ok(report) => report.spoken_summary(),
            Err(e) => {
                tracing::warn!(error = %e, "perception failed");
                failure_notice(&e).to_string()
            }
        },
        Intent::Search(query) => {
            let Some(searcher) = &caps.searcher else {
                return SEARCH_UNAVAILABLE.to_string();
            };
            match searcher.summarize(&query).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(error = %e, query = %query, "search failed");
                    SEARCH_FAILED.to_string()
                }
            }
        }
        Intent::Stop => FAREWELL.to_string(),
        Intent::Echo(text) => text,
    }
}

/// Control handle for a running session
///
/// Dropping the handle stops the session at its next stop check.
pub struct SessionHandle {
    id: Uuid,
    stop: watch::Sender<bool>,
    status: watch::Receiver<SessionStatus>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Start a session on the current runtime
    #[must_use]
    pub fn spawn(
        input: Box<dyn AudioInput>,
        output: Box<dyn AudioOutput>,
        caps: Capabilities,
        listen_timeout: Duration,
    ) -> Self {
        let id = Uuid::new_v4();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(SessionStatus::new());

        let session = Session {
            input,
            output,
            caps,
            listen_timeout,
            status: status_tx,
            stop: stop_rx,
        };

        let span = tracing::info_span!("assistant", session = %id);
        let task = tokio::spawn(tracing::Instrument::instrument(session.run(), span));

        Self {
            id,
            stop: stop_tx,
            status: status_rx,
            task,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current status snapshot
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Ask the session to stop at its next stop check
    pub fn request_stop(&self) {
        self.stop.send_replace(true);
    }

    /// Whether the session task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the session and wait for it to exit
    ///
    /// # Errors
    ///
    /// Returns error if the session task panicked
    pub async fn stop(self) -> Result<SessionStatus> {
        self.request_stop();
        let status = self.status.clone();
        self.task
            .await
            .map_err(|e| Error::Session(format!("session task failed: {e}")))?;
        let final_status = status.borrow().clone();
        Ok(final_status)
    }
}

/// Starts, tracks, and stops sessions by id
pub struct SessionManager {
    devices: Arc<dyn AudioDevices>,
    caps: Capabilities,
    listen_timeout: Duration,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(devices: Arc<dyn AudioDevices>, caps: Capabilities, listen_timeout: Duration) -> Self {
        Self {
            devices,
            caps,
            listen_timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open audio devices and start a new session
    ///
    /// # Errors
    ///
    /// Returns error if the audio devices cannot be opened
    pub async fn start(&self) -> Result<Uuid> {
        let (input, output) = self.devices.open().await?;
        let handle = SessionHandle::spawn(input, output, self.caps.clone(), self.listen_timeout);
        let id = handle.id();

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, h| !h.is_finished());
        sessions.insert(id, handle);

        tracing::info!(session = %id, active = sessions.len(), "assistant session registered");
        Ok(id)
    }

    /// Status of a session, including one that ended on its own
    pub async fn status(&self, id: Uuid) -> Option<SessionStatus> {
        self.sessions.lock().await.get(&id).map(SessionHandle::status)
    }

    /// Stop a session and forget it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`] if no such session exists
    pub async fn stop(&self, id: Uuid) -> Result<SessionStatus> {
        let handle = self
            .sessions
            .lock()
            .await
            .remove(&id)
            .ok_or_else(|| Error::Session(format!("no session {id}")))?;
        handle.stop().await
    }

    /// Stop every session
    pub async fn stop_all(&self) {
        let handles: Vec<SessionHandle> = self
            .sessions
            .lock()
            .await
            .drain()
            .map(|(_, h)| h)
            .collect();
        for handle in handles {
            let id = handle.id();
            if let Err(e) = handle.stop().await {
                tracing::warn!(session = %id, error = %e, "session did not stop cleanly");
            }
        }
    }

    /// Ids of tracked sessions
    pub async fn list(&self) -> Vec<Uuid> {
        self.sessions.lock().await.keys().copied().collect()
    }
}
