//! Event-stream protocol: typed events, SSE framing, remote client
//!
//! Events travel one direction, producer to consumer, over a
//! `tokio::sync::mpsc` channel (in-process) or an SSE connection (remote,
//! see [`client`]). Ordering is the producer's responsibility; the
//! framing layer never reorders, duplicates, or drops frames.

pub mod client;
mod error;
mod events;
pub mod sse;

pub use error::StreamError;
pub use events::StreamEvent;
