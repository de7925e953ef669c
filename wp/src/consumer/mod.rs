//! Stream Consumer - rebuilds session state from the event sequence
//!
//! The consumer is a pull loop over the event channel: each event passes
//! through [`StreamConsumer::apply`], which owns every phase transition.
//! No listener registration, no callbacks.

mod state;

pub use state::{ConsumerPhase, Progress, RecordedError, SessionMeta, StreamConsumer};
