//! Deterministic offline day generator
//!
//! Used by `wp plan` and by tests. Output is a pure function of the trip
//! id, day index, and whether refinement issues were passed, so repeated
//! runs (and cache comparisons) are stable. Refinement output spends less
//! and keeps stops closer together, so the repair loop converges.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{DayGenerator, DayRequest, GeneratorError};
use crate::domain::{Activity, ActivityCategory, ItineraryDay, Location, TransportMode};

/// Offline generator producing plausible, deterministic day content
pub struct SampleGenerator {
    /// Artificial per-day delay, for demo pacing
    delay: Duration,
}

impl SampleGenerator {
    pub fn new() -> Self {
        Self { delay: Duration::ZERO }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    fn rng_for(request: &DayRequest) -> StdRng {
        let mut hasher = DefaultHasher::new();
        request.trip.trip_id.hash(&mut hasher);
        request.day_index.hash(&mut hasher);
        request.refinement.is_some().hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish())
    }

    /// City-center coordinates derived from the destination label
    fn base_location(destination: &str) -> (f64, f64) {
        let mut hasher = DefaultHasher::new();
        destination.hash(&mut hasher);
        let h = hasher.finish();
        let lat = 35.0 + (h % 2000) as f64 / 100.0; // 35.0 .. 55.0
        let lng = -10.0 + ((h >> 16) % 3000) as f64 / 100.0; // -10.0 .. 20.0
        (lat, lng)
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DayGenerator for SampleGenerator {
    async fn generate_day(&self, request: &DayRequest) -> Result<ItineraryDay, GeneratorError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let trip = &request.trip;
        let refining = request.refinement.as_ref().is_some_and(|r| !r.is_empty());
        let mut rng = Self::rng_for(request);

        debug!(
            trip_id = %trip.trip_id,
            day_index = request.day_index,
            refining,
            prior_days = request.prior_titles.len(),
            "SampleGenerator::generate_day"
        );

        // Spend around the day's proportional budget share; refinement
        // output deliberately comes in under it.
        let share = trip.budget / f64::from(trip.total_days.max(1));
        let spend_factor: f64 = if refining {
            rng.random_range(0.45..0.65)
        } else {
            rng.random_range(0.70..1.05)
        };
        let day_spend = share * spend_factor;

        let (base_lat, base_lng) = Self::base_location(&trip.destination);
        // Refined days keep stops within easy walking range
        let spread = if refining { 0.004 } else { 0.015 };
        let spot = move |rng: &mut StdRng, name: String| Location {
            name,
            lat: base_lat + rng.random_range(-spread..spread),
            lng: base_lng + rng.random_range(-spread..spread),
        };

        let theme = trip
            .preferences
            .get(request.day_index as usize % trip.preferences.len().max(1))
            .cloned()
            .unwrap_or_else(|| "old town".to_string());

        let activities = vec![
            Activity {
                time: "09:00".to_string(),
                name: format!("{theme} morning"),
                description: format!("Start the day exploring {} ({theme})", trip.destination),
                category: ActivityCategory::Activity,
                estimated_cost: day_spend * 0.25,
                duration_minutes: 150,
                location: spot(&mut rng, format!("{} quarter", trip.destination)),
                transport_mode: Some(TransportMode::Walk),
            },
            Activity {
                time: "12:30".to_string(),
                name: "Local lunch".to_string(),
                description: "Neighborhood restaurant near the morning route".to_string(),
                category: ActivityCategory::Meal,
                estimated_cost: day_spend * 0.2,
                duration_minutes: 90,
                location: spot(&mut rng, "Lunch spot".to_string()),
                transport_mode: Some(TransportMode::Walk),
            },
            Activity {
                time: "15:00".to_string(),
                name: format!("{} highlight", trip.destination),
                description: "Afternoon visit to a signature sight".to_string(),
                category: ActivityCategory::Activity,
                estimated_cost: day_spend * 0.3,
                duration_minutes: 150,
                location: spot(&mut rng, "Signature sight".to_string()),
                transport_mode: Some(TransportMode::Transit),
            },
            Activity {
                time: "19:30".to_string(),
                name: "Dinner".to_string(),
                description: "Evening meal to close the day".to_string(),
                category: ActivityCategory::Meal,
                estimated_cost: day_spend * 0.25,
                duration_minutes: 120,
                location: spot(&mut rng, "Dinner spot".to_string()),
                transport_mode: Some(TransportMode::Walk),
            },
        ];

        Ok(ItineraryDay {
            day_index: request.day_index,
            day_number: request.day_index + 1,
            date: trip.date_for(request.day_index),
            title: format!("Day {}: {theme} in {}", request.day_index + 1, trip.destination),
            activities,
            food_recommendations: Some(vec![
                format!("{} market hall", trip.destination),
                "Ask the lunch spot for their daily special".to_string(),
            ]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TripParams;
    use chrono::NaiveDate;

    fn request(day_index: u32, refinement: Option<super::super::RefinementIssues>) -> DayRequest {
        DayRequest {
            trip: TripParams {
                trip_id: "lisbon-test".to_string(),
                destination: "Lisbon".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                total_days: 4,
                travelers: 2,
                budget: 2000.0,
                preferences: vec!["museums".to_string()],
            },
            day_index,
            prior_titles: vec![],
            refinement,
        }
    }

    #[tokio::test]
    async fn test_deterministic_output() {
        let generator = SampleGenerator::new();
        let a = generator.generate_day(&request(1, None)).await.unwrap();
        let b = generator.generate_day(&request(1, None)).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_day_shape() {
        let generator = SampleGenerator::new();
        let day = generator.generate_day(&request(2, None)).await.unwrap();

        assert_eq!(day.day_index, 2);
        assert_eq!(day.day_number, 3);
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2026, 9, 3).unwrap());
        assert_eq!(day.activities.len(), 4);
        assert!(day.activities.iter().all(|a| a.start_minutes().is_some()));
    }

    #[tokio::test]
    async fn test_refinement_spends_less() {
        let generator = SampleGenerator::new();
        let draft = generator.generate_day(&request(0, None)).await.unwrap();
        let refined = generator
            .generate_day(&request(
                0,
                Some(super::super::RefinementIssues {
                    budget: vec!["day 1 over budget".to_string()],
                    logistics: vec![],
                }),
            ))
            .await
            .unwrap();

        assert!(refined.total_cost() < draft.total_cost());
    }
}
