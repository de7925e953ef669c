//! Budget and logistics review passes

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::DirectorConfig;
use crate::domain::{ItineraryDay, Location, TransportMode, TripParams, ValidationReport, Verdict};

/// A Director invocation's full output
///
/// The report is what goes on the wire; the categorized issue lists feed
/// the refinement request for the flagged days.
#[derive(Debug, Clone)]
pub struct Review {
    pub report: ValidationReport,
    pub budget_issues: Vec<String>,
    pub logistics_issues: Vec<String>,
}

impl Review {
    /// Synthetic result for a review that timed out: a non-blocking
    /// WARNING with nothing flagged, so the session can still terminate.
    pub fn timeout_warning(iteration: u32) -> Self {
        Self {
            report: ValidationReport {
                iteration,
                verdict: Verdict::Warning,
                budget_verified: false,
                logistics_verified: false,
                flagged_days: vec![],
                logs: vec!["Director review timed out; plan not verified".to_string()],
            },
            budget_issues: vec![],
            logistics_issues: vec![],
        }
    }
}

/// The validation director
pub struct Director {
    config: DirectorConfig,
}

struct BudgetFindings {
    verified: bool,
    overage_warning: bool,
    flagged: Vec<u32>,
    issues: Vec<String>,
}

struct LogisticsFindings {
    verified: bool,
    flagged: Vec<u32>,
    issues: Vec<String>,
}

impl Director {
    pub fn new(config: DirectorConfig) -> Self {
        Self { config }
    }

    /// Evaluate the current plan and produce a verdict
    ///
    /// Async so callers can bound it with a timeout; the computation
    /// itself never suspends.
    pub async fn review(&self, params: &TripParams, days: &BTreeMap<u32, ItineraryDay>, iteration: u32) -> Review {
        let budget = self.check_budget(params, days);
        let logistics = self.check_logistics(days);

        let mut flagged: Vec<u32> = budget.flagged.iter().chain(logistics.flagged.iter()).copied().collect();
        flagged.sort_unstable();
        flagged.dedup();

        let verdict = if !flagged.is_empty() {
            Verdict::Rejected
        } else if budget.verified && logistics.verified && !budget.overage_warning {
            Verdict::Approved
        } else {
            Verdict::Warning
        };

        let mut logs = Vec::new();
        logs.extend(budget.issues.iter().cloned());
        logs.extend(logistics.issues.iter().cloned());
        if logs.is_empty() {
            logs.push(format!("Iteration {iteration}: budget and logistics checks passed"));
        }

        info!(
            iteration,
            ?verdict,
            flagged_days = flagged.len(),
            budget_verified = budget.verified,
            logistics_verified = logistics.verified,
            "Director::review"
        );

        Review {
            report: ValidationReport {
                iteration,
                verdict,
                budget_verified: budget.verified,
                logistics_verified: logistics.verified,
                flagged_days: flagged,
                logs,
            },
            budget_issues: budget.issues,
            logistics_issues: logistics.issues,
        }
    }

    /// Budget pass: total spend against the stated budget plus tolerance
    fn check_budget(&self, params: &TripParams, days: &BTreeMap<u32, ItineraryDay>) -> BudgetFindings {
        let total: f64 = days.values().map(ItineraryDay::total_cost).sum();
        let limit = params.budget * (1.0 + self.config.budget_tolerance);
        debug!(total, budget = params.budget, limit, "Director::check_budget");

        if total <= params.budget {
            return BudgetFindings {
                verified: true,
                overage_warning: false,
                flagged: vec![],
                issues: vec![],
            };
        }

        if total <= limit {
            // Over budget but inside the tolerance band: not blocking
            return BudgetFindings {
                verified: true,
                overage_warning: true,
                flagged: vec![],
                issues: vec![format!(
                    "Total spend {total:.0} exceeds budget {:.0} but is within tolerance",
                    params.budget
                )],
            };
        }

        // Blocking overrun: flag the days spending past their fair share
        let share = params.budget / f64::from(params.total_days.max(1));
        let share_limit = share * (1.0 + self.config.budget_tolerance);

        let mut flagged = Vec::new();
        let mut issues = vec![format!(
            "Total spend {total:.0} exceeds budget {:.0} by more than {:.0}% tolerance",
            params.budget,
            self.config.budget_tolerance * 100.0
        )];

        for (idx, day) in days {
            let cost = day.total_cost();
            if cost > share_limit {
                issues.push(format!(
                    "Day {} spends {cost:.0}, over its {share_limit:.0} share",
                    day.day_number
                ));
                flagged.push(*idx);
            }
        }

        if flagged.is_empty() {
            // Spread evenly but still over: repair the most expensive day
            if let Some((idx, day)) = days
                .iter()
                .max_by(|a, b| a.1.total_cost().total_cmp(&b.1.total_cost()))
            {
                issues.push(format!(
                    "Day {} is the most expensive at {:.0}",
                    day.day_number,
                    day.total_cost()
                ));
                flagged.push(*idx);
            }
        }

        BudgetFindings {
            verified: false,
            overage_warning: false,
            flagged,
            issues,
        }
    }

    /// Logistics pass: impossible overlaps and unreachable hops
    fn check_logistics(&self, days: &BTreeMap<u32, ItineraryDay>) -> LogisticsFindings {
        let mut flagged = Vec::new();
        let mut issues = Vec::new();

        for (idx, day) in days {
            let violations = day_violations(day);
            if !violations.is_empty() {
                flagged.push(*idx);
                issues.extend(violations);
            }
        }

        LogisticsFindings {
            verified: issues.is_empty(),
            flagged,
            issues,
        }
    }
}

/// Check one day's schedule for overlaps and infeasible travel
fn day_violations(day: &ItineraryDay) -> Vec<String> {
    let mut violations = Vec::new();

    let mut timed: Vec<_> = day.activities.iter().collect();
    for activity in &timed {
        if activity.start_minutes().is_none() {
            violations.push(format!(
                "Day {}: '{}' has unparseable start time '{}'",
                day.day_number, activity.name, activity.time
            ));
        }
    }
    if !violations.is_empty() {
        return violations;
    }

    timed.sort_by_key(|a| a.start_minutes());

    for pair in timed.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        // Times validated above
        let prev_end = prev.end_minutes().unwrap_or(0);
        let next_start = next.start_minutes().unwrap_or(0);

        if next_start < prev_end {
            violations.push(format!(
                "Day {}: '{}' starts {} min before '{}' ends",
                day.day_number,
                next.name,
                prev_end - next_start,
                prev.name
            ));
            continue;
        }

        let gap = next_start - prev_end;
        let mode = next.transport_mode.unwrap_or(TransportMode::Walk);
        let distance_km = haversine_km(&prev.location, &next.location);
        let travel_minutes = distance_km / mode.typical_speed_kmh() * 60.0;

        if travel_minutes > f64::from(gap) {
            violations.push(format!(
                "Day {}: {:.1} km to '{}' needs {:.0} min by {:?} but only {} min are free",
                day.day_number, distance_km, next.name, travel_minutes, mode, gap
            ));
        }
    }

    violations
}

/// Great-circle distance in kilometers
fn haversine_km(a: &Location, b: &Location) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
