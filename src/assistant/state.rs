//! Session state and observable status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a session is in its listen / recognize / dispatch / speak cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantState {
    Idle,
    Listening,
    Recognizing,
    Dispatching,
    Speaking,
    Error,
}

impl AssistantState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Recognizing => "recognizing",
            Self::Dispatching => "dispatching",
            Self::Speaking => "speaking",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AssistantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a session published on every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: AssistantState,
    pub started_at: DateTime<Utc>,
    /// Cycles that ended with a spoken response
    pub cycles: u64,
    /// Listening windows that closed without speech
    pub silent_windows: u64,
    /// Utterances that could not be transcribed
    pub recognition_failures: u64,
    pub last_transcript: Option<String>,
    pub last_response: Option<String>,
}

impl SessionStatus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AssistantState::Idle,
            started_at: Utc::now(),
            cycles: 0,
            silent_windows: 0,
            recognition_failures: 0,
            last_transcript: None,
            last_response: None,
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}
