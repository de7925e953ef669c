//! Core DayCache implementation

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Unique identifier for a trip
pub type TripId = String;

/// A single cached day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix timestamp (ms) when the entry was written
    #[serde(rename = "cached-at")]
    pub cached_at: i64,
    /// The day content as stored by the producer
    pub day: serde_json::Value,
}

impl CacheEntry {
    /// Age of this entry relative to now
    pub fn age(&self) -> Duration {
        let now = chrono::Utc::now().timestamp_millis();
        Duration::from_millis(now.saturating_sub(self.cached_at).max(0) as u64)
    }

    /// Whether the entry is still usable under the given freshness bound
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.age() <= max_age
    }
}

/// Statistics for one trip's cached days
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cached days
    pub entry_count: usize,
    /// Total bytes on disk
    pub total_bytes: u64,
    /// Age of the oldest entry, if any
    pub oldest_age: Option<Duration>,
}

/// The day cache store
pub struct DayCache {
    /// Base path for storage
    base_path: PathBuf,
}

impl DayCache {
    /// Open or create a day cache at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(base_path.join("trips")).context("Failed to create cache directory")?;
        debug!(path = %base_path.display(), "DayCache::open");
        Ok(Self { base_path })
    }

    fn trip_dir(&self, trip_id: &str) -> PathBuf {
        self.base_path.join("trips").join(sanitize(trip_id))
    }

    fn entry_path(&self, trip_id: &str, day_index: u32) -> PathBuf {
        self.trip_dir(trip_id).join(format!("day-{:04}.json", day_index))
    }

    /// Write a day entry, replacing any prior entry for the same index
    ///
    /// Writes to a temp file and renames so readers never observe a
    /// half-written entry.
    pub fn put(&self, trip_id: &str, day_index: u32, day: &serde_json::Value) -> Result<()> {
        let dir = self.trip_dir(trip_id);
        fs::create_dir_all(&dir).context("Failed to create trip cache directory")?;

        let entry = CacheEntry {
            cached_at: chrono::Utc::now().timestamp_millis(),
            day: day.clone(),
        };

        let path = self.entry_path(trip_id, day_index);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(&entry).context("Failed to serialize cache entry")?;
        fs::write(&tmp, json).context("Failed to write cache entry")?;
        fs::rename(&tmp, &path).context("Failed to finalize cache entry")?;

        debug!(trip_id, day_index, "DayCache::put: entry written");
        Ok(())
    }

    /// Read a day entry if present and fresh
    ///
    /// Stale or unreadable entries are treated as misses; a corrupt entry
    /// is logged and skipped rather than failing the caller.
    pub fn get(&self, trip_id: &str, day_index: u32, max_age: Duration) -> Option<CacheEntry> {
        let path = self.entry_path(trip_id, day_index);
        let content = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(e) => {
                warn!(trip_id, day_index, error = %e, "DayCache::get: corrupt entry, ignoring");
                return None;
            }
        };

        if !entry.is_fresh(max_age) {
            debug!(trip_id, day_index, age_secs = entry.age().as_secs(), "DayCache::get: stale entry");
            return None;
        }

        debug!(trip_id, day_index, "DayCache::get: hit");
        Some(entry)
    }

    /// List the day indices with fresh entries for a trip, ascending
    pub fn cached_indices(&self, trip_id: &str, max_age: Duration) -> Vec<u32> {
        let dir = self.trip_dir(trip_id);
        let Ok(entries) = fs::read_dir(&dir) else {
            return vec![];
        };

        let mut indices: Vec<u32> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| parse_day_index(&e.file_name().to_string_lossy()))
            .filter(|&idx| self.get(trip_id, idx, max_age).is_some())
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Remove all entries for a trip, returning the number removed
    pub fn clear(&self, trip_id: &str) -> Result<usize> {
        let dir = self.trip_dir(trip_id);
        if !dir.exists() {
            return Ok(0);
        }

        let count = fs::read_dir(&dir)
            .context("Failed to read trip cache directory")?
            .filter_map(|e| e.ok())
            .filter(|e| parse_day_index(&e.file_name().to_string_lossy()).is_some())
            .count();

        fs::remove_dir_all(&dir).context("Failed to remove trip cache directory")?;
        debug!(trip_id, count, "DayCache::clear");
        Ok(count)
    }

    /// Compute statistics for a trip's entries
    pub fn stats(&self, trip_id: &str) -> Result<CacheStats> {
        let dir = self.trip_dir(trip_id);
        if !dir.exists() {
            return Ok(CacheStats {
                entry_count: 0,
                total_bytes: 0,
                oldest_age: None,
            });
        }

        let mut entry_count = 0;
        let mut total_bytes = 0;
        let mut oldest_age: Option<Duration> = None;

        for entry in fs::read_dir(&dir).context("Failed to read trip cache directory")? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(idx) = parse_day_index(&name) else { continue };

            entry_count += 1;
            total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);

            if let Some(e) = self.get(trip_id, idx, Duration::MAX) {
                let age = e.age();
                oldest_age = Some(oldest_age.map_or(age, |o| o.max(age)));
            }
        }

        Ok(CacheStats {
            entry_count,
            total_bytes,
            oldest_age,
        })
    }

    /// List all trip ids with at least one entry
    pub fn list_trips(&self) -> Result<Vec<TripId>> {
        let trips_dir = self.base_path.join("trips");
        let mut trips: Vec<String> = fs::read_dir(&trips_dir)
            .context("Failed to read cache directory")?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        trips.sort();
        Ok(trips)
    }
}

/// Parse a day index out of an entry filename like `day-0003.json`
fn parse_day_index(name: &str) -> Option<u32> {
    name.strip_prefix("day-")?.strip_suffix(".json")?.parse().ok()
}

/// Replace path-hostile characters so trip ids map to safe directory names
fn sanitize(trip_id: &str) -> String {
    trip_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
