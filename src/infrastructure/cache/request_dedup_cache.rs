use crate::domain::entities::{RequestCacheEntry, RequestCorrelation};
use crate::domain::value_objects::RequestId;
use crate::shared::clock::{Clock, SystemClock, to_chrono};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_REQUEST_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_REQUEST_CAPACITY: usize = 1000;

/// Remembers idempotency keys for one session so a client-side resend of the
/// same logical write can be dropped before it reaches the network. Not
/// durable and not a substitute for server-side idempotency.
pub struct RequestDeduplicationCache {
    entries: Mutex<HashMap<RequestId, RequestCacheEntry>>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl RequestDeduplicationCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True iff a live entry exists for `request_id`. An expired entry is
    /// evicted on the way out.
    pub async fn is_duplicate(&self, request_id: &RequestId) -> bool {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();
        let ttl = to_chrono(self.ttl);

        let live = match entries.get(request_id) {
            Some(entry) => entry.is_live(now, ttl),
            None => return false,
        };

        if !live {
            entries.remove(request_id);
            debug!(target: "offline::dedup", request_id = %request_id, "evicted expired request key");
        }
        live
    }

    /// Remembers `request_id` as accepted now, replacing any earlier record.
    /// Once the map has grown past `capacity`, expired entries are swept
    /// before the insert.
    pub async fn record_request(&self, request_id: RequestId, correlation: RequestCorrelation) {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();

        if entries.len() > self.capacity {
            let ttl = to_chrono(self.ttl);
            let before = entries.len();
            entries.retain(|_, entry| entry.is_live(now, ttl));
            debug!(
                target: "offline::dedup",
                evicted = before - entries.len(),
                remaining = entries.len(),
                "swept expired request keys"
            );
        }

        let entry = RequestCacheEntry::new(request_id.clone(), now, correlation);
        entries.insert(request_id, entry);
    }

    /// Check-and-record under one lock. Returns `false` when a live entry
    /// already exists, leaving it untouched.
    pub async fn record_if_new(&self, request_id: RequestId, correlation: RequestCorrelation) -> bool {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();
        let ttl = to_chrono(self.ttl);

        if entries
            .get(&request_id)
            .is_some_and(|entry| entry.is_live(now, ttl))
        {
            return false;
        }

        if entries.len() > self.capacity {
            entries.retain(|_, entry| entry.is_live(now, ttl));
        }
        let entry = RequestCacheEntry::new(request_id.clone(), now, correlation);
        entries.insert(request_id, entry);
        true
    }

    /// Live entry for diagnostics; expired entries are reported as absent.
    pub async fn entry(&self, request_id: &RequestId) -> Option<RequestCacheEntry> {
        let entries = self.entries.lock().await;
        let now = self.clock.now();
        entries
            .get(request_id)
            .filter(|entry| entry.is_live(now, to_chrono(self.ttl)))
            .cloned()
    }

    pub async fn clear_request(&self, request_id: &RequestId) -> bool {
        self.entries.lock().await.remove(request_id).is_some()
    }

    pub async fn clear_all(&self) {
        self.entries.lock().await.clear();
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();
        let ttl = to_chrono(self.ttl);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now, ttl));
        before - entries.len()
    }

    /// Physical size, including expired entries not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for RequestDeduplicationCache {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TTL, DEFAULT_REQUEST_CAPACITY)
    }
}
