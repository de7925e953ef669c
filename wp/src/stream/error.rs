//! Stream transport and framing errors

use thiserror::Error;

/// Errors from encoding, decoding, or delivering stream events
#[derive(Debug, Error)]
pub enum StreamError {
    /// Frame text did not follow the `event:`/`data:` layout
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The consumer side of the channel is gone; the session must stop
    #[error("Stream channel closed")]
    Closed,

    #[error("Connection error: {0}")]
    Connection(String),
}

impl StreamError {
    /// True when the error means the session was cancelled rather than broken
    pub fn is_cancellation(&self) -> bool {
        matches!(self, StreamError::Closed)
    }
}
