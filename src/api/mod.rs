//! HTTP API server for Sightline

pub mod assistant;
pub mod camera;
mod error;
pub mod health;
pub mod speech;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::request::Parts;
use regex::Regex;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use crate::assistant::{Searcher, SessionManager, Synthesizer};
use crate::perception::PerceptionService;
use crate::{Error, Result};

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub perception: PerceptionService,
    /// Present when the voice assistant is enabled
    pub sessions: Option<Arc<SessionManager>>,
    pub searcher: Option<Arc<dyn Searcher>>,
    pub synthesizer: Option<Arc<dyn Synthesizer>>,
}

impl ApiState {
    /// State with perception only
    #[must_use]
    pub const fn new(perception: PerceptionService) -> Self {
        Self {
            perception,
            sessions: None,
            searcher: None,
            synthesizer: None,
        }
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: Arc<SessionManager>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    #[must_use]
    pub fn with_searcher(mut self, searcher: Arc<dyn Searcher>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    cors_origins: Regex,
}

impl ApiServer {
    /// Create a server allowing cross-origin requests from origins that
    /// fully match `cors_origins`
    ///
    /// # Errors
    ///
    /// Returns error if the origin pattern is not a valid regex
    pub fn new(state: ApiState, port: u16, cors_origins: &str) -> Result<Self> {
        let cors_origins = Regex::new(&format!("^(?:{cors_origins})$"))
            .map_err(|e| Error::Config(format!("invalid CORS origin pattern: {e}")))?;

        Ok(Self {
            state: Arc::new(state),
            port,
            cors_origins,
        })
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let origins = self.cors_origins.clone();
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(
                move |origin: &HeaderValue, _parts: &Parts| {
                    origin.to_str().is_ok_and(|o| origins.is_match(o))
                },
            ))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true);

        Router::new()
            .merge(camera::router(self.state.clone()))
            .merge(speech::router(self.state.clone()))
            .nest("/assistant", assistant::router(self.state.clone()))
            .merge(health::router(self.state.clone()))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
