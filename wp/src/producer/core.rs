//! StreamProducer - orchestrates one session end to end

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use daycache::DayCache;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::refinement::{Decision, RefinementTracker};
use super::session::StreamSession;
use crate::config::Config;
use crate::director::{Director, Review};
use crate::domain::{ItineraryDay, TripId, TripParams, ValidationMetadata};
use crate::generator::{DayGenerator, DayRequest, GeneratorError, RefinementIssues};
use crate::stream::{StreamError, StreamEvent};

/// Orchestrates generation, validation, and refinement for one session,
/// serializing the lifecycle into the ordered event sequence
pub struct StreamProducer {
    generator: Arc<dyn DayGenerator>,
    director: Director,
    cache: Option<Arc<DayCache>>,
    generation_timeout: Duration,
    review_timeout: Duration,
    max_iterations: u32,
    cache_max_age: Duration,
}

impl StreamProducer {
    pub fn new(generator: Arc<dyn DayGenerator>, cache: Option<Arc<DayCache>>, config: &Config) -> Self {
        Self {
            generator,
            director: Director::new(config.director.clone()),
            cache,
            generation_timeout: config.generator.timeout(),
            review_timeout: config.director.review_timeout(),
            max_iterations: config.director.max_iterations,
            cache_max_age: config.cache.max_age(),
        }
    }

    /// Run one session, emitting its full event sequence to `tx`
    ///
    /// Returns `Err(StreamError::Closed)` when the consumer goes away
    /// mid-session; no further generator or director work happens after
    /// that point.
    pub async fn run(&self, params: TripParams, tx: mpsc::Sender<StreamEvent>) -> Result<(), StreamError> {
        let cached_days: Vec<u32> = match &self.cache {
            Some(cache) => cache
                .cached_indices(&params.trip_id, self.cache_max_age)
                .into_iter()
                .filter(|idx| *idx < params.total_days)
                .collect(),
            None => vec![],
        };

        let session = StreamSession::new(&params, cached_days);
        info!(
            trip_id = %session.trip_id,
            session_id = %session.session_id,
            total_days = session.total_days,
            cached_days = session.cached_days.len(),
            "StreamProducer::run: session starting"
        );

        emit(&tx, session.meta_event()).await?;

        let mut days: BTreeMap<u32, ItineraryDay> = BTreeMap::new();
        let mut generated_any = false;

        // Initial pass, ascending day order
        for day_index in 0..params.total_days {
            if session.is_cached(day_index)
                && let Some(day) = self.cached_day(&params.trip_id, day_index)
            {
                days.insert(day_index, day.clone());
                emit(
                    &tx,
                    StreamEvent::Day {
                        day_index,
                        day,
                        cached: Some(true),
                    },
                )
                .await?;
                emit(
                    &tx,
                    progress_event(day_index, params.total_days, format!("Day {} served from cache", day_index + 1)),
                )
                .await?;
                continue;
            }

            let request = DayRequest {
                trip: params.clone(),
                day_index,
                prior_titles: days.values().map(|d| d.title.clone()).collect(),
                refinement: None,
            };

            match self.generate(&request).await {
                Ok(day) => {
                    self.store(&params.trip_id, &day);
                    days.insert(day_index, day.clone());
                    generated_any = true;
                    emit(
                        &tx,
                        StreamEvent::Day {
                            day_index,
                            day,
                            cached: None,
                        },
                    )
                    .await?;
                    emit(
                        &tx,
                        progress_event(
                            day_index,
                            params.total_days,
                            format!("Planned day {} of {}", day_index + 1, params.total_days),
                        ),
                    )
                    .await?;
                }
                Err(e) if e.is_fatal() => {
                    warn!(day_index, error = %e, "StreamProducer::run: fatal generator error");
                    emit(
                        &tx,
                        StreamEvent::Error {
                            day_index: None,
                            message: e.to_string(),
                            recoverable: false,
                        },
                    )
                    .await?;
                    return Ok(());
                }
                Err(e) => {
                    warn!(day_index, error = %e, "StreamProducer::run: day failed, continuing");
                    emit(
                        &tx,
                        StreamEvent::Error {
                            day_index: Some(day_index),
                            message: e.to_string(),
                            recoverable: true,
                        },
                    )
                    .await?;
                }
            }
        }

        if days.is_empty() {
            emit(
                &tx,
                StreamEvent::Error {
                    day_index: None,
                    message: "No itinerary days could be generated".to_string(),
                    recoverable: false,
                },
            )
            .await?;
            return Ok(());
        }

        // Fully-cached sessions skip validation entirely
        let validation = if generated_any {
            Some(self.validate_and_refine(&params, &mut days, &tx).await?)
        } else {
            None
        };

        let total_activities: u32 = days.values().map(|d| d.activity_count() as u32).sum();
        emit(
            &tx,
            StreamEvent::Done {
                total_days: params.total_days,
                total_activities,
                validation,
            },
        )
        .await?;

        info!(trip_id = %params.trip_id, "StreamProducer::run: session complete");
        Ok(())
    }

    /// Director/refinement cycle; see [`RefinementTracker`] for the bound
    async fn validate_and_refine(
        &self,
        params: &TripParams,
        days: &mut BTreeMap<u32, ItineraryDay>,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<ValidationMetadata, StreamError> {
        let mut tracker = RefinementTracker::new(self.max_iterations);

        loop {
            let iteration = tracker.start_validation();
            // The built-in review computes without suspending, so this
            // bound only fires for directors that await external work.
            // A timeout degrades to a no-flag WARNING, never a hang.
            let review = match timeout(self.review_timeout, self.director.review(params, days, iteration)).await {
                Ok(review) => review,
                Err(_) => {
                    warn!(iteration, "StreamProducer: director review timed out");
                    Review::timeout_warning(iteration)
                }
            };

            let report = &review.report;
            emit(
                tx,
                StreamEvent::Validation {
                    iteration: report.iteration,
                    status: report.verdict,
                    budget_verified: report.budget_verified,
                    logistics_verified: report.logistics_verified,
                    flagged_days: report.flagged_days.clone(),
                    logs: report.logs.clone(),
                },
            )
            .await?;

            match tracker.decide(&review) {
                Decision::Accept | Decision::Exhaust => {
                    return Ok(tracker.metadata(&review.report));
                }
                Decision::Refine(request) => {
                    emit(
                        tx,
                        StreamEvent::Refinement {
                            iteration: request.iteration,
                            days_to_refine: request.days_to_refine.clone(),
                            budget_issues: request.budget_issues.clone(),
                            logistics_issues: request.logistics_issues.clone(),
                        },
                    )
                    .await?;

                    let issues = RefinementIssues {
                        budget: request.budget_issues.clone(),
                        logistics: request.logistics_issues.clone(),
                    };

                    for &day_index in &request.days_to_refine {
                        let gen_request = DayRequest {
                            trip: params.clone(),
                            day_index,
                            prior_titles: days.values().map(|d| d.title.clone()).collect(),
                            refinement: Some(issues.clone()),
                        };

                        match self.generate(&gen_request).await {
                            Ok(day) => {
                                // Wholesale replacement of the flagged day
                                self.store(&params.trip_id, &day);
                                days.insert(day_index, day.clone());
                                emit(
                                    tx,
                                    StreamEvent::Day {
                                        day_index,
                                        day,
                                        cached: None,
                                    },
                                )
                                .await?;
                            }
                            Err(e) => {
                                // Keep the prior day; the failure lands in
                                // the validation log trail
                                warn!(day_index, error = %e, "StreamProducer: refinement failed for day");
                                tracker.note_failure(day_index, &e.to_string());
                            }
                        }
                    }
                }
            }
        }
    }

    /// Invoke the generator under the configured timeout
    async fn generate(&self, request: &DayRequest) -> Result<ItineraryDay, GeneratorError> {
        match timeout(self.generation_timeout, self.generator.generate_day(request)).await {
            Ok(result) => result,
            Err(_) => Err(GeneratorError::Timeout(self.generation_timeout)),
        }
    }

    fn cached_day(&self, trip_id: &TripId, day_index: u32) -> Option<ItineraryDay> {
        let entry = self.cache.as_ref()?.get(trip_id, day_index, self.cache_max_age)?;
        match serde_json::from_value(entry.day) {
            Ok(day) => Some(day),
            Err(e) => {
                warn!(trip_id = %trip_id, day_index, error = %e, "StreamProducer: cache entry undeserializable");
                None
            }
        }
    }

    fn store(&self, trip_id: &TripId, day: &ItineraryDay) {
        let Some(cache) = &self.cache else { return };
        match serde_json::to_value(day) {
            Ok(value) => {
                if let Err(e) = cache.put(trip_id, day.day_index, &value) {
                    warn!(trip_id = %trip_id, day_index = day.day_index, error = %e, "StreamProducer: cache write failed");
                }
            }
            Err(e) => warn!(error = %e, "StreamProducer: day unserializable for cache"),
        }
    }
}

fn progress_event(day_index: u32, total_days: u32, message: String) -> StreamEvent {
    let current_day = day_index + 1;
    StreamEvent::Progress {
        current_day,
        total_days,
        percent: f64::from(current_day) / f64::from(total_days.max(1)) * 100.0,
        message,
    }
}

/// Send one event, treating a closed channel as session cancellation
async fn emit(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> Result<(), StreamError> {
    debug!(event_type = event.event_type(), "StreamProducer: emit");
    tx.send(event).await.map_err(|_| StreamError::Closed)
}
