//! Stream Producer - owns one generation session per trip
//!
//! Orchestrates the Day Generator, Validation Director, and Refinement
//! Loop, serializing the session lifecycle into the ordered event
//! sequence defined in [`crate::stream`].

mod core;
mod refinement;
mod session;

pub use self::core::StreamProducer;
pub use refinement::{Decision, RefinePhase, RefinementTracker};
pub use session::{SessionRegistry, StreamSession};
