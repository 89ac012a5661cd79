//! Camera stream access
//!
//! Holds the configured stream endpoint and fetches single decoded frames from it.

mod endpoint;
mod frame;
mod source;

pub use endpoint::EndpointStore;
pub use frame::Frame;
pub use source::{FrameSource, HttpFrameSource, MAX_FRAME_BYTES, find_jpeg};
