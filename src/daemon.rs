//! Daemon - the main Sightline service
//!
//! Provisions the detection model, wires perception, speech, and search
//! into the HTTP API, and optionally starts an assistant session.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{ApiServer, ApiState};
use crate::assistant::{
    Capabilities, Perceiver, Searcher, SessionManager, Synthesizer, Transcriber,
};
use crate::camera::{EndpointStore, HttpFrameSource};
use crate::perception::{PerceptionPipeline, PerceptionService};
use crate::search::WebSearch;
use crate::vision::{self, Detector, ObjectModel};
use crate::voice::{SpeechToText, TextToSpeech};
use crate::{Config, Error, Result};

/// The Sightline daemon
pub struct Daemon {
    config: Config,
    start_assistant: bool,
}

impl Daemon {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            start_assistant: false,
        }
    }

    /// Start an assistant session as soon as the server is up
    #[must_use]
    pub const fn with_assistant(mut self, start: bool) -> Self {
        self.start_assistant = start;
        self
    }

    /// Download the detection model if it is not on disk yet
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelProvisioning`] if the model cannot be fetched
    pub async fn provision_model(config: &Config) -> Result<PathBuf> {
        vision::ensure_model(&config.model.path, &config.model.url).await
    }

    /// Load the object model off the async executor
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelProvisioning`] if the model cannot be loaded
    pub async fn load_model(config: &Config) -> Result<Arc<dyn ObjectModel>> {
        let model_config = config.model.clone();
        tokio::task::spawn_blocking(move || vision::load_model(&model_config))
            .await
            .map_err(|e| Error::ModelProvisioning(format!("model loader failed: {e}")))?
    }

    /// Build the perception service over a loaded model
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client or the initial camera URL is invalid
    pub fn perception_service(
        config: &Config,
        model: Arc<dyn ObjectModel>,
    ) -> Result<PerceptionService> {
        let endpoints = EndpointStore::new(config.camera.stream_port, &config.camera.stream_path);
        if let Some(url) = &config.camera.initial_url {
            endpoints.set(url)?;
            tracing::info!(url = %url, "camera endpoint configured at startup");
        }

        let source = Arc::new(HttpFrameSource::from_config(&config.camera)?);
        let detector = Detector::new(model, config.model.confidence_threshold);
        let pipeline = PerceptionPipeline::new(source, detector, config.pipeline.timeout);

        Ok(PerceptionService::new(endpoints, pipeline))
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the model cannot be provisioned or the server fails
    pub async fn run(self) -> Result<()> {
        let config = self.config;

        // No pipeline can run without a model
        Self::provision_model(&config).await?;
        let model = Self::load_model(&config).await?;
        let perception = Self::perception_service(&config, model)?;

        let synthesizer: Option<Arc<dyn Synthesizer>> =
            match TextToSpeech::from_config(&config.api_keys, &config.voice) {
                Ok(tts) => Some(Arc::new(tts)),
                Err(e) => {
                    tracing::warn!(error = %e, "speech synthesis unavailable");
                    None
                }
            };

        let searcher: Option<Arc<dyn Searcher>> = match WebSearch::from_keys(&config.api_keys) {
            Some(search) => Some(Arc::new(search)),
            None => {
                tracing::info!("web search unavailable - no Brave or Serper key");
                None
            }
        };

        let sessions = session_manager(&config, &perception, synthesizer.clone(), searcher.clone());

        let mut state = ApiState::new(perception);
        if let Some(sessions) = &sessions {
            state = state.with_sessions(Arc::clone(sessions));
        }
        if let Some(searcher) = searcher {
            state = state.with_searcher(searcher);
        }
        if let Some(synthesizer) = synthesizer {
            state = state.with_synthesizer(synthesizer);
        }

        let server = ApiServer::new(state, config.server.port, &config.server.cors_origins)?;
        let mut server_task = server.spawn();

        // Set up shutdown signal
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        if self.start_assistant {
            match &sessions {
                Some(manager) => {
                    let id = manager.start().await?;
                    tracing::info!(session = %id, "assistant listening");
                }
                None => tracing::warn!("--assistant ignored: voice assistant unavailable"),
            }
        }

        tracing::info!(port = config.server.port, "sightline running");

        let outcome = tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::info!("shutdown requested");
                Ok(())
            }
            joined = &mut server_task => match joined {
                Ok(result) => result,
                Err(e) => Err(Error::Config(format!("API server task failed: {e}"))),
            },
        };

        if let Some(manager) = sessions {
            manager.stop_all().await;
        }
        server_task.abort();

        tracing::info!("daemon stopped");
        outcome
    }
}

/// Assistant sessions need speech in both directions and audio hardware
fn session_manager(
    config: &Config,
    perception: &PerceptionService,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    searcher: Option<Arc<dyn Searcher>>,
) -> Option<Arc<SessionManager>> {
    if !config.voice.enabled {
        tracing::info!("voice disabled - assistant sessions unavailable");
        return None;
    }

    let transcriber: Arc<dyn Transcriber> =
        match SpeechToText::from_keys(&config.api_keys, &config.voice.stt_model) {
            Ok(stt) => Arc::new(stt),
            Err(e) => {
                tracing::warn!(error = %e, "assistant unavailable");
                return None;
            }
        };
    let synthesizer = synthesizer?;
    let perceiver: Arc<dyn Perceiver> = Arc::new(perception.clone());

    let caps = Capabilities {
        transcriber,
        synthesizer,
        perceiver,
        searcher,
    };

    audio_devices().map(|devices| {
        Arc::new(SessionManager::new(
            devices,
            caps,
            config.voice.listen_timeout,
        ))
    })
}

#[cfg(feature = "audio")]
#[allow(clippy::unnecessary_wraps)]
fn audio_devices() -> Option<Arc<dyn crate::assistant::AudioDevices>> {
    Some(Arc::new(crate::voice::SystemAudio))
}

#[cfg(not(feature = "audio"))]
fn audio_devices() -> Option<Arc<dyn crate::assistant::AudioDevices>> {
    tracing::info!("built without audio support - assistant sessions unavailable");
    None
}
