//! Bounded refinement loop state machine
//!
//! Tracks the `initial-pass → validating → (refining ⇄ validating) →
//! approved | exhausted` cycle and enforces the iteration cap that
//! guarantees termination. The cap is an explicit counter, never an
//! assumption that regeneration converges.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::director::Review;
use crate::domain::{RefinementRequest, ValidationMetadata, ValidationReport};

/// Where the session sits in the validation/repair cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefinePhase {
    InitialPass,
    Validating { iteration: u32 },
    Refining { iteration: u32 },
    Approved { iterations: u32 },
    Exhausted { iterations: u32 },
}

/// Outcome of one validation pass
#[derive(Debug)]
pub enum Decision {
    /// Plan acceptable; stop iterating
    Accept,
    /// Regenerate the listed days, then validate again
    Refine(RefinementRequest),
    /// Iteration cap reached (or nothing actionable); stop with the last
    /// computed flags
    Exhaust,
}

/// Drives and bounds the repair cycle for one session
pub struct RefinementTracker {
    max_iterations: u32,
    phase: RefinePhase,
    iteration: u32,
    refined_days: BTreeSet<u32>,
    logs: Vec<String>,
}

impl RefinementTracker {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            phase: RefinePhase::InitialPass,
            iteration: 0,
            refined_days: BTreeSet::new(),
            logs: Vec::new(),
        }
    }

    /// Enter the next validation pass, returning its 1-based iteration
    pub fn start_validation(&mut self) -> u32 {
        self.iteration += 1;
        self.phase = RefinePhase::Validating {
            iteration: self.iteration,
        };
        debug!(iteration = self.iteration, "RefinementTracker::start_validation");
        self.iteration
    }

    /// Apply a review's verdict and decide the next step
    pub fn decide(&mut self, review: &Review) -> Decision {
        let report = &review.report;
        self.logs.extend(report.logs.iter().cloned());

        if report.is_acceptable() {
            info!(iteration = self.iteration, "RefinementTracker: plan accepted");
            self.phase = RefinePhase::Approved {
                iterations: self.iteration,
            };
            return Decision::Accept;
        }

        if self.iteration >= self.max_iterations || !report.needs_refinement() {
            warn!(
                iteration = self.iteration,
                max_iterations = self.max_iterations,
                "RefinementTracker: stopping unapproved"
            );
            self.logs
                .push(format!("Stopped after {} iteration(s) without approval", self.iteration));
            self.phase = RefinePhase::Exhausted {
                iterations: self.iteration,
            };
            return Decision::Exhaust;
        }

        self.refined_days.extend(report.flagged_days.iter().copied());
        self.phase = RefinePhase::Refining {
            iteration: self.iteration,
        };

        Decision::Refine(RefinementRequest {
            iteration: self.iteration,
            days_to_refine: report.flagged_days.clone(),
            budget_issues: review.budget_issues.clone(),
            logistics_issues: review.logistics_issues.clone(),
        })
    }

    /// Record a failed regeneration; the prior day stays in place
    pub fn note_failure(&mut self, day_index: u32, message: &str) {
        self.logs
            .push(format!("Refinement of day index {day_index} failed: {message}"));
    }

    /// Summary for the terminal `done` event
    pub fn metadata(&self, last_report: &ValidationReport) -> ValidationMetadata {
        ValidationMetadata {
            budget_verified: last_report.budget_verified,
            logistics_verified: last_report.logistics_verified,
            total_iterations: self.iteration,
            refined_days: self.refined_days.iter().copied().collect(),
            logs: self.logs.clone(),
        }
    }

    pub fn phase(&self) -> &RefinePhase {
        &self.phase
    }

    pub fn total_iterations(&self) -> u32 {
        self.iteration
    }
}
