//! Day generator error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while generating one day
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The upstream service cannot produce output at all; session-fatal
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    /// Output arrived but could not be turned into a day
    #[error("Invalid generator output: {0}")]
    InvalidOutput(String),
}

impl GeneratorError {
    /// Fatal errors terminate the whole session; everything else is
    /// day-scoped and recoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GeneratorError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(GeneratorError::Unavailable("down".to_string()).is_fatal());
        assert!(!GeneratorError::Timeout(Duration::from_secs(30)).is_fatal());
        assert!(!GeneratorError::InvalidOutput("truncated".to_string()).is_fatal());
    }
}
