//! Wayplan - progressive travel itinerary generation and streaming
//!
//! A trip session generates one itinerary day at a time and streams each
//! day to the consumer the moment it is ready, then validates the whole
//! plan against budget and logistics constraints, repairing flagged days
//! through a bounded refinement loop.
//!
//! # Architecture
//!
//! Data flows one direction:
//!
//! ```text
//! producer (generate → validate → refine) → stream (typed events) → consumer (state machine)
//! ```
//!
//! - [`producer`] owns one session per trip: day generation, the
//!   validation director, and the refinement loop.
//! - [`stream`] defines the typed event protocol, its SSE framing, and a
//!   client for remote streams.
//! - [`consumer`] rebuilds displayable state from the event sequence with
//!   idempotent day merging.
//! - [`director`] holds the budget and logistics checks.
//! - [`generator`] is the day-generation seam; the offline
//!   [`generator::SampleGenerator`] is the built-in implementation.
//!
//! Day cache persistence lives in the `daycache` crate.

pub mod cli;
pub mod config;
pub mod consumer;
pub mod director;
pub mod domain;
pub mod generator;
pub mod producer;
pub mod stream;
