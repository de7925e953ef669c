//! Day Generator interface
//!
//! Content generation is an external collaborator: the producer only sees
//! this trait. Each call produces one complete day (or fails); refinement
//! passes the Director's findings back so the regenerated day can address
//! them.

use async_trait::async_trait;

mod error;
mod sample;

pub use error::GeneratorError;
pub use sample::SampleGenerator;

use crate::domain::{ItineraryDay, TripParams};

/// Issues a regenerated day should address, grouped by category
#[derive(Debug, Clone, Default)]
pub struct RefinementIssues {
    pub budget: Vec<String>,
    pub logistics: Vec<String>,
}

impl RefinementIssues {
    pub fn is_empty(&self) -> bool {
        self.budget.is_empty() && self.logistics.is_empty()
    }
}

/// Request for one day's content
#[derive(Debug, Clone)]
pub struct DayRequest {
    /// Trip parameters shared by every day
    pub trip: TripParams,
    /// 0-based day to generate
    pub day_index: u32,
    /// Titles of the days already generated, as prior context
    pub prior_titles: Vec<String>,
    /// Present only on refinement passes
    pub refinement: Option<RefinementIssues>,
}

/// Stateless day generator - each call is independent
#[async_trait]
pub trait DayGenerator: Send + Sync {
    /// Produce the content for a single day
    async fn generate_day(&self, request: &DayRequest) -> Result<ItineraryDay, GeneratorError>;
}
