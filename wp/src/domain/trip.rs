//! Trip parameters and itinerary content types
//!
//! Day indices are 0-based everywhere internally; `ItineraryDay::day_number`
//! carries the 1-based value used for display. Wire field names are
//! camelCase to match the stream protocol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique identifier for a trip
pub type TripId = String;

/// Parameters for one trip's generation session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripParams {
    /// Trip identifier (also the cache key)
    pub trip_id: TripId,
    /// Destination label, e.g. "Lisbon"
    pub destination: String,
    /// First day of the trip
    pub start_date: NaiveDate,
    /// Total number of days to plan
    pub total_days: u32,
    /// Number of travelers
    pub travelers: u32,
    /// Total budget for the whole trip
    pub budget: f64,
    /// Free-form preference tags, e.g. "museums", "street-food"
    #[serde(default)]
    pub preferences: Vec<String>,
}

impl TripParams {
    /// Calendar date for a 0-based day index
    pub fn date_for(&self, day_index: u32) -> NaiveDate {
        self.start_date + chrono::Days::new(u64::from(day_index))
    }
}

/// Category of an activity within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Activity,
    Meal,
    Transport,
    Lodging,
}

/// How the traveler moves to the next activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walk,
    Transit,
    Drive,
    Flight,
}

impl TransportMode {
    /// Typical urban travel speed used for reachability checks
    pub fn typical_speed_kmh(&self) -> f64 {
        match self {
            TransportMode::Walk => 4.5,
            TransportMode::Transit => 20.0,
            TransportMode::Drive => 30.0,
            TransportMode::Flight => 500.0,
        }
    }
}

/// A named point with coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// One scheduled item within a day
///
/// Immutable once attached to a day: refinement replaces the whole day,
/// never a single activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Start time as "HH:MM" (24h)
    pub time: String,
    pub name: String,
    pub description: String,
    pub category: ActivityCategory,
    pub estimated_cost: f64,
    pub duration_minutes: u32,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_mode: Option<TransportMode>,
}

impl Activity {
    /// Start time in minutes since midnight, if parseable
    pub fn start_minutes(&self) -> Option<u32> {
        let (h, m) = self.time.split_once(':')?;
        let h: u32 = h.parse().ok()?;
        let m: u32 = m.parse().ok()?;
        if h > 23 || m > 59 {
            return None;
        }
        Some(h * 60 + m)
    }

    /// End time in minutes since midnight, if the start is parseable
    pub fn end_minutes(&self) -> Option<u32> {
        Some(self.start_minutes()? + self.duration_minutes)
    }
}

/// One day of the itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    /// 0-based, stable across refinement
    pub day_index: u32,
    /// 1-based display number
    pub day_number: u32,
    pub date: NaiveDate,
    pub title: String,
    pub activities: Vec<Activity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_recommendations: Option<Vec<String>>,
}

impl ItineraryDay {
    /// Sum of estimated costs across the day's activities
    pub fn total_cost(&self) -> f64 {
        self.activities.iter().map(|a| a.estimated_cost).sum()
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(time: &str, duration: u32) -> Activity {
        Activity {
            time: time.to_string(),
            name: "Test".to_string(),
            description: String::new(),
            category: ActivityCategory::Activity,
            estimated_cost: 10.0,
            duration_minutes: duration,
            location: Location {
                name: "Somewhere".to_string(),
                lat: 0.0,
                lng: 0.0,
            },
            transport_mode: None,
        }
    }

    #[test]
    fn test_date_for() {
        let params = TripParams {
            trip_id: "t".to_string(),
            destination: "Lisbon".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            total_days: 5,
            travelers: 2,
            budget: 2000.0,
            preferences: vec![],
        };
        assert_eq!(params.date_for(0), NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        assert_eq!(params.date_for(4), NaiveDate::from_ymd_opt(2026, 9, 5).unwrap());
    }

    #[test]
    fn test_start_minutes_parsing() {
        assert_eq!(activity("09:30", 60).start_minutes(), Some(570));
        assert_eq!(activity("00:00", 60).start_minutes(), Some(0));
        assert_eq!(activity("24:00", 60).start_minutes(), None);
        assert_eq!(activity("morning", 60).start_minutes(), None);
        assert_eq!(activity("09:30", 60).end_minutes(), Some(630));
    }

    #[test]
    fn test_day_total_cost() {
        let day = ItineraryDay {
            day_index: 0,
            day_number: 1,
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            title: "Arrival".to_string(),
            activities: vec![activity("09:00", 60), activity("12:00", 90)],
            food_recommendations: None,
        };
        assert!((day.total_cost() - 20.0).abs() < f64::EPSILON);
        assert_eq!(day.activity_count(), 2);
    }

    #[test]
    fn test_wire_field_names() {
        let day = ItineraryDay {
            day_index: 2,
            day_number: 3,
            date: NaiveDate::from_ymd_opt(2026, 9, 3).unwrap(),
            title: "Old town".to_string(),
            activities: vec![activity("10:00", 120)],
            food_recommendations: Some(vec!["Pastel de nata".to_string()]),
        };

        let json = serde_json::to_string(&day).unwrap();
        assert!(json.contains("\"dayIndex\":2"));
        assert!(json.contains("\"dayNumber\":3"));
        assert!(json.contains("estimatedCost"));
        assert!(json.contains("durationMinutes"));
        assert!(json.contains("foodRecommendations"));

        let parsed: ItineraryDay = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, day);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&ActivityCategory::Lodging).unwrap();
        assert_eq!(json, "\"lodging\"");
        let json = serde_json::to_string(&TransportMode::Transit).unwrap();
        assert_eq!(json, "\"transit\"");
    }
}
