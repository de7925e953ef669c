//! Stream event vocabulary
//!
//! The wire representation of all session state transitions. A session's
//! event sequence is append-only and ordered: exactly one `meta` first,
//! then `day`/`progress`/`validation`/`refinement` events, then exactly
//! one `done` (success) or one fatal `error`.

use serde::{Deserialize, Serialize};

use crate::domain::{ItineraryDay, ValidationMetadata, Verdict};

/// A single event in a generation session's stream
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Session header; always the first event
    #[serde(rename_all = "camelCase")]
    Meta {
        trip_id: String,
        destination: String,
        total_days: u32,
        start_date: chrono::NaiveDate,
        /// True when the entire result is served from cache
        #[serde(skip_serializing_if = "Option::is_none")]
        cached: Option<bool>,
        /// First non-cached day index when continuing a partial run
        #[serde(skip_serializing_if = "Option::is_none")]
        resumed_from: Option<u32>,
    },

    /// One completed day; re-emitted wholesale when a day is refined
    #[serde(rename_all = "camelCase")]
    Day {
        day_index: u32,
        day: ItineraryDay,
        #[serde(skip_serializing_if = "Option::is_none")]
        cached: Option<bool>,
    },

    /// Generation progress for display; carries no state transition
    #[serde(rename_all = "camelCase")]
    Progress {
        current_day: u32,
        total_days: u32,
        percent: f64,
        message: String,
    },

    /// Director findings for one validation pass
    #[serde(rename_all = "camelCase")]
    Validation {
        iteration: u32,
        status: Verdict,
        budget_verified: bool,
        logistics_verified: bool,
        flagged_days: Vec<u32>,
        logs: Vec<String>,
    },

    /// Targeted regeneration is starting for the listed days
    #[serde(rename_all = "camelCase")]
    Refinement {
        iteration: u32,
        days_to_refine: Vec<u32>,
        budget_issues: Vec<String>,
        logistics_issues: Vec<String>,
    },

    /// Terminal success; always the last event when present
    #[serde(rename_all = "camelCase")]
    Done {
        total_days: u32,
        total_activities: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        validation: Option<ValidationMetadata>,
    },

    /// A failure; `recoverable: true` is day- or connection-scoped,
    /// `recoverable: false` terminates the session without a `done`
    #[serde(rename_all = "camelCase")]
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        day_index: Option<u32>,
        message: String,
        recoverable: bool,
    },
}

impl StreamEvent {
    /// Wire tag for this event, matching the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Meta { .. } => "meta",
            StreamEvent::Day { .. } => "day",
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::Validation { .. } => "validation",
            StreamEvent::Refinement { .. } => "refinement",
            StreamEvent::Done { .. } => "done",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends the session stream
    pub fn is_terminal(&self) -> bool {
        match self {
            StreamEvent::Done { .. } => true,
            StreamEvent::Error { recoverable, .. } => !recoverable,
            _ => false,
        }
    }
}
