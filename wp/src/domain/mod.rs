//! Domain types for trips, itinerary days, and validation verdicts

mod report;
mod trip;

pub use report::{RefinementRequest, ValidationMetadata, ValidationReport, Verdict};
pub use trip::{Activity, ActivityCategory, ItineraryDay, Location, TransportMode, TripId, TripParams};
