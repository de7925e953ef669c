//! DayCache - file-backed per-trip itinerary day cache
//!
//! Stores one JSON entry per (trip, day index) so repeat or resumed
//! generation sessions can serve already-built days instantly instead of
//! regenerating them.
//!
//! # Architecture
//!
//! ```text
//! cache/
//! └── trips/
//!     └── {trip_id}/
//!         ├── day-0000.json    # { "cached-at": ..., "day": {...} }
//!         ├── day-0001.json
//!         └── ...
//! ```
//!
//! Entries carry an age; readers pass a `max_age` and stale entries are
//! treated as misses. Only one writer per trip is expected (the active
//! producer session); entries for different trips never share files.

pub mod cli;
mod store;

pub use store::{CacheEntry, CacheStats, DayCache, TripId};

/// Default maximum entry age before a cached day is considered stale (24h)
pub const DEFAULT_MAX_AGE_SECS: u64 = 24 * 60 * 60;
