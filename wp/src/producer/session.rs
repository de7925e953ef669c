//! Session identity and the per-trip active-session registry

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{TripId, TripParams};
use crate::stream::StreamEvent;

/// One generation run for one trip
#[derive(Debug, Clone)]
pub struct StreamSession {
    /// Unique id for this run
    pub session_id: String,
    pub trip_id: TripId,
    pub destination: String,
    pub total_days: u32,
    pub start_date: chrono::NaiveDate,
    /// Day indices served from cache at session start, ascending
    pub cached_days: Vec<u32>,
    /// True when every day comes from cache
    pub all_cached: bool,
    /// First day index that needs fresh generation, when continuing a
    /// partially cached run
    pub resumed_from: Option<u32>,
}

impl StreamSession {
    pub fn new(params: &TripParams, cached_days: Vec<u32>) -> Self {
        let all_cached = params.total_days > 0 && cached_days.len() as u32 == params.total_days;
        let resumed_from = if cached_days.is_empty() || all_cached {
            None
        } else {
            (0..params.total_days).find(|idx| !cached_days.contains(idx))
        };

        Self {
            session_id: Uuid::now_v7().to_string(),
            trip_id: params.trip_id.clone(),
            destination: params.destination.clone(),
            total_days: params.total_days,
            start_date: params.start_date,
            cached_days,
            all_cached,
            resumed_from,
        }
    }

    pub fn is_cached(&self, day_index: u32) -> bool {
        self.cached_days.binary_search(&day_index).is_ok()
    }

    /// The session header; always the first event emitted
    pub fn meta_event(&self) -> StreamEvent {
        StreamEvent::Meta {
            trip_id: self.trip_id.clone(),
            destination: self.destination.clone(),
            total_days: self.total_days,
            start_date: self.start_date,
            cached: self.all_cached.then_some(true),
            resumed_from: self.resumed_from,
        }
    }
}

struct ActiveSession {
    token: u64,
    handle: JoinHandle<()>,
}

/// At most one active producer session per trip id
///
/// Spawning a session for a trip aborts and replaces any in-flight
/// session for the same trip; sessions unregister themselves when their
/// future completes.
pub struct SessionRegistry {
    active: Mutex<HashMap<TripId, ActiveSession>>,
    next_token: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        })
    }

    /// Spawn a session future, superseding any active session for the trip
    pub async fn spawn<F>(self: &Arc<Self>, trip_id: &str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        let mut active = self.active.lock().await;

        if let Some(prev) = active.remove(trip_id) {
            info!(trip_id, "SessionRegistry::spawn: superseding in-flight session");
            prev.handle.abort();
        }

        let registry = Arc::clone(self);
        let trip = trip_id.to_string();
        let handle = tokio::spawn(async move {
            fut.await;
            registry.finish(&trip, token).await;
        });

        active.insert(trip_id.to_string(), ActiveSession { token, handle });
        debug!(trip_id, token, "SessionRegistry::spawn: session registered");
    }

    /// Remove a finished session, unless it was already superseded
    async fn finish(&self, trip_id: &str, token: u64) {
        let mut active = self.active.lock().await;
        if active.get(trip_id).is_some_and(|s| s.token == token) {
            active.remove(trip_id);
            debug!(trip_id, token, "SessionRegistry::finish: session unregistered");
        }
    }

    /// Abort the active session for a trip, if any
    pub async fn cancel(&self, trip_id: &str) -> bool {
        let mut active = self.active.lock().await;
        match active.remove(trip_id) {
            Some(session) => {
                session.handle.abort();
                info!(trip_id, "SessionRegistry::cancel: session aborted");
                true
            }
            None => false,
        }
    }

    pub async fn is_active(&self, trip_id: &str) -> bool {
        let active = self.active.lock().await;
        active.get(trip_id).is_some_and(|s| !s.handle.is_finished())
    }

    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }
}
