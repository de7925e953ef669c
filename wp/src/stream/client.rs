//! Remote stream consumption over a long-lived SSE connection
//!
//! Bridges an HTTP event stream into the same `mpsc` channel the
//! in-process producer uses, so the consumer state machine never knows
//! which transport fed it.

use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{StreamEvent, sse};

/// Follow a stream endpoint until it closes, forwarding decoded events
///
/// Unknown or malformed payloads are logged and skipped (the session
/// survives them); connection failure returns a `Connection` error and
/// closes the channel, letting the consumer apply its partial-success
/// rule. The connection is dropped as soon as a terminal event arrives or
/// the receiver goes away.
pub async fn follow(url: &str, tx: mpsc::Sender<StreamEvent>) -> Result<(), super::StreamError> {
    let mut es = EventSource::get(url);

    while let Some(item) = es.next().await {
        match item {
            Ok(Event::Open) => {
                debug!(url, "follow: connection open");
            }
            Ok(Event::Message(msg)) => {
                let event = match sse::decode(&msg.data) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(error = %e, event = %msg.event, "follow: skipping undecodable event");
                        continue;
                    }
                };

                let terminal = event.is_terminal();
                if tx.send(event).await.is_err() {
                    debug!("follow: consumer gone, closing connection");
                    break;
                }
                if terminal {
                    debug!("follow: terminal event received, closing connection");
                    break;
                }
            }
            Err(reqwest_eventsource::Error::StreamEnded) => {
                // Normal stream end; the consumer decides whether closure
                // without `done` is partial success or an error.
                debug!("follow: stream ended");
                break;
            }
            Err(e) => {
                warn!(error = %e, "follow: connection failed");
                es.close();
                return Err(super::StreamError::Connection(e.to_string()));
            }
        }
    }

    es.close();
    Ok(())
}
