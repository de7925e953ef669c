//! Consumer phase machine and idempotent day merge

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::{ItineraryDay, TripId, ValidationMetadata, ValidationReport};
use crate::stream::StreamEvent;

/// Where the consumer sits in the session lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerPhase {
    Idle,
    Connecting,
    Streaming,
    Validating,
    Refining,
    /// Session finished; `partial` marks a connection-lost completion
    /// with only the days received so far
    Complete { partial: bool },
    Error,
}

impl ConsumerPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsumerPhase::Complete { .. } | ConsumerPhase::Error)
    }
}

/// Session header captured from the `meta` event
#[derive(Debug, Clone)]
pub struct SessionMeta {
    pub trip_id: TripId,
    pub destination: String,
    pub total_days: u32,
    pub start_date: NaiveDate,
    pub cached: bool,
    pub resumed_from: Option<u32>,
}

/// An error surfaced by the stream, kept for display
#[derive(Debug, Clone)]
pub struct RecordedError {
    pub day_index: Option<u32>,
    pub message: String,
    pub recoverable: bool,
}

/// Progress indicator state; display-only, never drives transitions
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current_day: u32,
    pub total_days: u32,
    pub percent: f64,
    pub message: String,
}

/// Reconstructs displayable session state from the ordered event stream
///
/// Day merge is keyed by day index: re-receiving an index overwrites the
/// prior version, so replays and refinement re-emissions never duplicate.
pub struct StreamConsumer {
    phase: ConsumerPhase,
    trip_id: Option<TripId>,
    meta: Option<SessionMeta>,
    days: BTreeMap<u32, ItineraryDay>,
    progress: Option<Progress>,
    last_validation: Option<ValidationReport>,
    refining_days: Vec<u32>,
    validation_metadata: Option<ValidationMetadata>,
    errors: Vec<RecordedError>,
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self {
            phase: ConsumerPhase::Idle,
            trip_id: None,
            meta: None,
            days: BTreeMap::new(),
            progress: None,
            last_validation: None,
            refining_days: Vec::new(),
            validation_metadata: None,
            errors: Vec::new(),
        }
    }

    /// Begin a session: clear all prior state and move to `Connecting`
    pub fn start(&mut self, trip_id: &str) {
        info!(trip_id, "StreamConsumer::start");
        *self = Self::new();
        self.trip_id = Some(trip_id.to_string());
        self.phase = ConsumerPhase::Connecting;
    }

    /// Apply one event; owns every phase transition
    pub fn apply(&mut self, event: StreamEvent) {
        if self.phase == ConsumerPhase::Idle {
            warn!(event_type = event.event_type(), "StreamConsumer::apply: event while idle, ignoring");
            return;
        }
        if self.phase.is_terminal() {
            warn!(event_type = event.event_type(), "StreamConsumer::apply: event after terminal, ignoring");
            return;
        }

        debug!(event_type = event.event_type(), "StreamConsumer::apply");
        match event {
            StreamEvent::Meta {
                trip_id,
                destination,
                total_days,
                start_date,
                cached,
                resumed_from,
            } => {
                self.trip_id = Some(trip_id.clone());
                self.meta = Some(SessionMeta {
                    trip_id,
                    destination,
                    total_days,
                    start_date,
                    cached: cached.unwrap_or(false),
                    resumed_from,
                });
                self.phase = ConsumerPhase::Streaming;
            }
            StreamEvent::Day { day_index, day, .. } => {
                // Idempotent: same index overwrites, never appends
                self.days.insert(day_index, day);
            }
            StreamEvent::Progress {
                current_day,
                total_days,
                percent,
                message,
            } => {
                self.progress = Some(Progress {
                    current_day,
                    total_days,
                    percent,
                    message,
                });
            }
            StreamEvent::Validation {
                iteration,
                status,
                budget_verified,
                logistics_verified,
                flagged_days,
                logs,
            } => {
                self.last_validation = Some(ValidationReport {
                    iteration,
                    verdict: status,
                    budget_verified,
                    logistics_verified,
                    flagged_days,
                    logs,
                });
                self.phase = ConsumerPhase::Validating;
            }
            StreamEvent::Refinement { days_to_refine, .. } => {
                self.refining_days = days_to_refine;
                self.phase = ConsumerPhase::Refining;
            }
            StreamEvent::Done { validation, .. } => {
                self.validation_metadata = validation;
                self.phase = ConsumerPhase::Complete { partial: false };
            }
            StreamEvent::Error {
                day_index,
                message,
                recoverable,
            } => {
                self.errors.push(RecordedError {
                    day_index,
                    message,
                    recoverable,
                });
                // Recoverable errors are display-only
                if !recoverable {
                    self.phase = ConsumerPhase::Error;
                }
            }
        }
    }

    /// The transport closed without a terminal event
    ///
    /// Partial-success rule: any received day yields a partial
    /// `Complete`, never `Error`.
    pub fn stream_closed(&mut self) {
        if self.phase.is_terminal() || self.phase == ConsumerPhase::Idle {
            return;
        }
        if self.days.is_empty() {
            warn!("StreamConsumer::stream_closed: connection lost with no days");
            self.errors.push(RecordedError {
                day_index: None,
                message: "connection lost".to_string(),
                recoverable: true,
            });
            self.phase = ConsumerPhase::Error;
        } else {
            info!(days = self.days.len(), "StreamConsumer::stream_closed: keeping partial itinerary");
            self.phase = ConsumerPhase::Complete { partial: true };
        }
    }

    /// Drain the channel until a terminal event or closure
    pub async fn run(&mut self, mut rx: mpsc::Receiver<StreamEvent>) {
        while let Some(event) = rx.recv().await {
            self.apply(event);
            if self.phase.is_terminal() {
                // Dropping rx closes the transport promptly
                return;
            }
        }
        self.stream_closed();
    }

    /// Cancel from any non-terminal phase; never produces `Complete`
    pub fn abort(&mut self) {
        if self.phase.is_terminal() || self.phase == ConsumerPhase::Idle {
            return;
        }
        info!(trip_id = self.trip_id.as_deref().unwrap_or(""), "StreamConsumer::abort");
        *self = Self::new();
    }

    /// After an error, reconnect with the same trip id
    pub fn retry(&mut self) -> Option<TripId> {
        if self.phase != ConsumerPhase::Error {
            return None;
        }
        let trip_id = self.trip_id.clone()?;
        self.start(&trip_id);
        Some(trip_id)
    }

    pub fn phase(&self) -> &ConsumerPhase {
        &self.phase
    }

    pub fn meta(&self) -> Option<&SessionMeta> {
        self.meta.as_ref()
    }

    /// Days received so far, ordered by index
    pub fn days(&self) -> &BTreeMap<u32, ItineraryDay> {
        &self.days
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    pub fn last_validation(&self) -> Option<&ValidationReport> {
        self.last_validation.as_ref()
    }

    pub fn refining_days(&self) -> &[u32] {
        &self.refining_days
    }

    pub fn validation_metadata(&self) -> Option<&ValidationMetadata> {
        self.validation_metadata.as_ref()
    }

    pub fn errors(&self) -> &[RecordedError] {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Verdict;

    fn meta_event(total_days: u32) -> StreamEvent {
        StreamEvent::Meta {
            trip_id: "lisbon".to_string(),
            destination: "Lisbon".to_string(),
            total_days,
            start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            cached: None,
            resumed_from: None,
        }
    }

    fn day_event(day_index: u32, title: &str) -> StreamEvent {
        StreamEvent::Day {
            day_index,
            day: ItineraryDay {
                day_index,
                day_number: day_index + 1,
                date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                title: title.to_string(),
                activities: vec![],
                food_recommendations: None,
            },
            cached: None,
        }
    }

    fn started(total_days: u32) -> StreamConsumer {
        let mut consumer = StreamConsumer::new();
        consumer.start("lisbon");
        consumer.apply(meta_event(total_days));
        consumer
    }

    #[test]
    fn test_full_lifecycle() {
        let mut consumer = StreamConsumer::new();
        assert_eq!(*consumer.phase(), ConsumerPhase::Idle);

        consumer.start("lisbon");
        assert_eq!(*consumer.phase(), ConsumerPhase::Connecting);

        consumer.apply(meta_event(2));
        assert_eq!(*consumer.phase(), ConsumerPhase::Streaming);
        assert_eq!(consumer.meta().unwrap().total_days, 2);

        consumer.apply(day_event(0, "Arrival"));
        consumer.apply(day_event(1, "Old town"));
        assert_eq!(consumer.days().len(), 2);

        consumer.apply(StreamEvent::Validation {
            iteration: 1,
            status: Verdict::Approved,
            budget_verified: true,
            logistics_verified: true,
            flagged_days: vec![],
            logs: vec![],
        });
        assert_eq!(*consumer.phase(), ConsumerPhase::Validating);

        consumer.apply(StreamEvent::Done {
            total_days: 2,
            total_activities: 8,
            validation: None,
        });
        assert_eq!(*consumer.phase(), ConsumerPhase::Complete { partial: false });
    }

    #[test]
    fn test_day_merge_is_idempotent() {
        let mut consumer = started(3);

        consumer.apply(day_event(1, "First version"));
        consumer.apply(day_event(1, "Refined version"));

        assert_eq!(consumer.days().len(), 1);
        assert_eq!(consumer.days()[&1].title, "Refined version");
    }

    #[test]
    fn test_refinement_cycle_phases() {
        let mut consumer = started(3);
        consumer.apply(day_event(0, "A"));

        consumer.apply(StreamEvent::Validation {
            iteration: 1,
            status: Verdict::Rejected,
            budget_verified: false,
            logistics_verified: true,
            flagged_days: vec![0],
            logs: vec!["over budget".to_string()],
        });
        assert_eq!(*consumer.phase(), ConsumerPhase::Validating);

        consumer.apply(StreamEvent::Refinement {
            iteration: 1,
            days_to_refine: vec![0],
            budget_issues: vec!["over budget".to_string()],
            logistics_issues: vec![],
        });
        assert_eq!(*consumer.phase(), ConsumerPhase::Refining);
        assert_eq!(consumer.refining_days(), &[0]);

        // Re-emitted day lands while refining
        consumer.apply(day_event(0, "Cheaper"));
        assert_eq!(*consumer.phase(), ConsumerPhase::Refining);
        assert_eq!(consumer.days()[&0].title, "Cheaper");
    }

    #[test]
    fn test_recoverable_error_keeps_phase() {
        let mut consumer = started(3);
        consumer.apply(StreamEvent::Error {
            day_index: Some(1),
            message: "generation timed out".to_string(),
            recoverable: true,
        });

        assert_eq!(*consumer.phase(), ConsumerPhase::Streaming);
        assert_eq!(consumer.errors().len(), 1);
        assert!(consumer.errors()[0].recoverable);
    }

    #[test]
    fn test_fatal_error_is_terminal() {
        let mut consumer = started(3);
        consumer.apply(StreamEvent::Error {
            day_index: None,
            message: "upstream down".to_string(),
            recoverable: false,
        });
        assert_eq!(*consumer.phase(), ConsumerPhase::Error);

        // Anything after terminal is dropped
        consumer.apply(day_event(0, "late"));
        assert!(consumer.days().is_empty());
    }

    #[test]
    fn test_partial_success_on_lost_connection() {
        let mut consumer = started(4);
        consumer.apply(day_event(0, "A"));
        consumer.apply(day_event(1, "B"));

        consumer.stream_closed();
        assert_eq!(*consumer.phase(), ConsumerPhase::Complete { partial: true });
        assert_eq!(consumer.days().len(), 2);
    }

    #[test]
    fn test_lost_connection_without_days_is_error() {
        let mut consumer = started(4);
        consumer.stream_closed();

        assert_eq!(*consumer.phase(), ConsumerPhase::Error);
        let error = consumer.errors().last().unwrap();
        assert_eq!(error.message, "connection lost");
        assert!(error.recoverable);
    }

    #[test]
    fn test_closure_after_done_stays_complete() {
        let mut consumer = started(1);
        consumer.apply(day_event(0, "A"));
        consumer.apply(StreamEvent::Done {
            total_days: 1,
            total_activities: 4,
            validation: None,
        });

        consumer.stream_closed();
        assert_eq!(*consumer.phase(), ConsumerPhase::Complete { partial: false });
    }

    #[test]
    fn test_abort_returns_to_idle() {
        let mut consumer = started(3);
        consumer.apply(day_event(0, "A"));

        consumer.abort();
        assert_eq!(*consumer.phase(), ConsumerPhase::Idle);
        assert!(consumer.days().is_empty());
        assert!(consumer.meta().is_none());
    }

    #[test]
    fn test_retry_only_after_error() {
        let mut consumer = started(3);
        assert_eq!(consumer.retry(), None);

        consumer.apply(StreamEvent::Error {
            day_index: None,
            message: "upstream down".to_string(),
            recoverable: false,
        });
        let trip_id = consumer.retry().expect("retry after error");
        assert_eq!(trip_id, "lisbon");
        assert_eq!(*consumer.phase(), ConsumerPhase::Connecting);
        assert!(consumer.errors().is_empty());
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let (tx, rx) = mpsc::channel(16);
        let mut consumer = StreamConsumer::new();
        consumer.start("lisbon");

        tx.send(meta_event(2)).await.unwrap();
        tx.send(day_event(0, "A")).await.unwrap();
        tx.send(day_event(1, "B")).await.unwrap();
        tx.send(StreamEvent::Done {
            total_days: 2,
            total_activities: 0,
            validation: None,
        })
        .await
        .unwrap();

        consumer.run(rx).await;
        assert_eq!(*consumer.phase(), ConsumerPhase::Complete { partial: false });
        assert_eq!(consumer.days().len(), 2);
    }

    #[tokio::test]
    async fn test_run_applies_partial_rule_on_closed_channel() {
        let (tx, rx) = mpsc::channel(16);
        let mut consumer = StreamConsumer::new();
        consumer.start("lisbon");

        tx.send(meta_event(4)).await.unwrap();
        tx.send(day_event(0, "A")).await.unwrap();
        drop(tx);

        consumer.run(rx).await;
        assert_eq!(*consumer.phase(), ConsumerPhase::Complete { partial: true });
    }
}
