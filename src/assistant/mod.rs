//! Voice assistant
//!
//! Runs cancellable listen → recognize → dispatch → speak sessions over
//! pluggable audio, speech, search, and perception capabilities.

mod capability;
mod intent;
mod session;
mod state;

pub use capability::{
    AudioDevices, AudioInput, AudioOutput, Perceiver, Searcher, Synthesizer, Transcriber,
};
pub use intent::Intent;
pub use session::{Capabilities, DEFAULT_LISTEN_TIMEOUT, SessionHandle, SessionManager};
pub use state::{AssistantState, SessionStatus};
