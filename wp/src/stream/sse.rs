//! Text event-stream framing
//!
//! One frame per event:
//!
//! ```text
//! event: day
//! data: {"type":"day","dayIndex":0,...}
//!
//! ```
//!
//! The JSON payload carries its own `type` tag, so a frame's `data` line
//! alone is enough to decode it; the `event:` line exists for
//! EventSource-style dispatch on the receiving end.

use tracing::warn;

use super::{StreamError, StreamEvent};

/// Encode an event into one SSE frame, including the trailing blank line
pub fn encode(event: &StreamEvent) -> Result<String, StreamError> {
    let data = serde_json::to_string(event)?;
    Ok(format!("event: {}\ndata: {}\n\n", event.event_type(), data))
}

/// Decode the `data` payload of a frame
pub fn decode(data: &str) -> Result<StreamEvent, StreamError> {
    Ok(serde_json::from_str(data)?)
}

/// Parse a complete frame (both `event:` and `data:` lines)
///
/// The `event:` line is checked against the payload's own tag; a mismatch
/// is logged but the payload wins, since the JSON tag is authoritative.
pub fn parse_frame(frame: &str) -> Result<StreamEvent, StreamError> {
    let mut event_name: Option<&str> = None;
    let mut data: Option<&str> = None;

    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event_name = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data = Some(rest.trim());
        } else if !line.trim().is_empty() && !line.starts_with(':') {
            return Err(StreamError::MalformedFrame(format!("unexpected line: {line:?}")));
        }
    }

    let data = data.ok_or_else(|| StreamError::MalformedFrame("missing data line".to_string()))?;
    let event = decode(data)?;

    if let Some(name) = event_name
        && name != event.event_type()
    {
        warn!(frame_event = name, payload_type = event.event_type(), "SSE frame tag mismatch");
    }

    Ok(event)
}
