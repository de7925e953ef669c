//! Wayplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main wayplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Day generator invocation limits
    pub generator: GeneratorConfig,

    /// Validation director settings
    pub director: DirectorConfig,

    /// Event stream settings
    pub stream: StreamConfig,

    /// Day cache settings
    pub cache: CacheConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear messages.
    pub fn validate(&self) -> Result<()> {
        if self.director.max_iterations == 0 {
            return Err(eyre::eyre!("director.max-iterations must be at least 1"));
        }
        if self.director.budget_tolerance < 0.0 {
            return Err(eyre::eyre!("director.budget-tolerance must not be negative"));
        }
        if self.stream.channel_capacity == 0 {
            return Err(eyre::eyre!("stream.channel-capacity must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .wayplan.yml
        let local_config = PathBuf::from(".wayplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/wayplan/wayplan.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("wayplan").join("wayplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Day generator invocation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Per-day generation timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Artificial per-day delay for the offline generator (demo pacing)
    #[serde(rename = "day-delay-ms")]
    pub day_delay_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            day_delay_ms: 0,
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Validation director settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Accepted overage fraction before the budget check fails (0.15 = 15%)
    #[serde(rename = "budget-tolerance")]
    pub budget_tolerance: f64,

    /// Hard cap on validation/refinement iterations per session
    #[serde(rename = "max-iterations")]
    pub max_iterations: u32,

    /// Director review timeout in milliseconds
    #[serde(rename = "review-timeout-ms")]
    pub review_timeout_ms: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            budget_tolerance: 0.15,
            max_iterations: 3,
            review_timeout_ms: 30_000,
        }
    }
}

impl DirectorConfig {
    pub fn review_timeout(&self) -> Duration {
        Duration::from_millis(self.review_timeout_ms)
    }
}

/// Event stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Capacity of the producer-to-consumer event channel
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { channel_capacity: 256 }
    }
}

/// Day cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether cached days are served at all
    pub enabled: bool,

    /// Cache directory; defaults to the platform data dir
    pub path: Option<PathBuf>,

    /// Maximum entry age before a cached day is regenerated
    #[serde(rename = "max-age-secs")]
    pub max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            max_age_secs: daycache::DEFAULT_MAX_AGE_SECS,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// Resolve the cache directory
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wayplan")
                .join("cache")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.director.max_iterations, 3);
        assert!((config.director.budget_tolerance - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.generator.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.director.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.director.budget_tolerance = -0.1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.stream.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = "director:\n  max-iterations: 5\n  budget-tolerance: 0.2\ncache:\n  enabled: false\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.director.max_iterations, 5);
        assert!((config.director.budget_tolerance - 0.2).abs() < f64::EPSILON);
        assert!(!config.cache.enabled);
        // Untouched sections keep their defaults
        assert_eq!(config.stream.channel_capacity, 256);
    }
}
