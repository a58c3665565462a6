use crate::application::ports::durable_store::DurableStore;
use crate::domain::entities::LastKnownGoodState;
use crate::domain::value_objects::ScopeKey;
use crate::infrastructure::storage::{load_json, save_json};
use crate::shared::clock::{Clock, SystemClock, to_chrono};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SNAPSHOT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

const KEY_PREFIX: &str = "lkg";

/// Last successful read of one data set, kept for display while offline.
///
/// Stored under `lkg:{namespace}` with the save time mirrored to
/// `lkg:{namespace}:timestamp` so staleness checks skip the payload.
pub struct LastKnownGoodStore<T> {
    store: Arc<dyn DurableStore>,
    data_key: String,
    timestamp_key: String,
    expiry: Duration,
    clock: Arc<dyn Clock>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> LastKnownGoodStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: Arc<dyn DurableStore>, namespace: &str) -> Self {
        Self::with_options(store, namespace, DEFAULT_SNAPSHOT_EXPIRY, Arc::new(SystemClock))
    }

    pub fn with_options(
        store: Arc<dyn DurableStore>,
        namespace: &str,
        expiry: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let data_key = format!("{KEY_PREFIX}:{namespace}");
        let timestamp_key = format!("{data_key}:timestamp");
        Self {
            store,
            data_key,
            timestamp_key,
            expiry,
            clock,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.data_key
    }

    pub async fn save(&self, data: T, scope: Option<ScopeKey>) -> Result<(), AppError> {
        let state = LastKnownGoodState::new(data, self.clock.now(), scope);
        save_json(self.store.as_ref(), &self.data_key, &state).await?;
        save_json(self.store.as_ref(), &self.timestamp_key, &state.timestamp).await?;
        debug!(
            target: "offline::lkg",
            key = %self.data_key,
            scope = state.scope.as_ref().map(ScopeKey::as_str),
            "saved last known good state"
        );
        Ok(())
    }

    /// Returns the snapshot only when it is fresh and its scope is
    /// compatible with `scope`. Anything else is purged.
    pub async fn get(&self, scope: Option<&ScopeKey>) -> Option<LastKnownGoodState<T>> {
        let raw = match self.store.get(&self.data_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(target: "offline::lkg", key = %self.data_key, error = %err, "failed to read snapshot");
                return None;
            }
        };

        let state: LastKnownGoodState<T> = match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(err) => {
                warn!(target: "offline::lkg", key = %self.data_key, error = %err, "corrupt snapshot");
                self.clear().await;
                return None;
            }
        };

        let now = self.clock.now();
        if state.is_expired(now, to_chrono(self.expiry)) {
            debug!(
                target: "offline::lkg",
                key = %self.data_key,
                age_secs = state.age(now).num_seconds(),
                "snapshot expired"
            );
            self.clear().await;
            return None;
        }

        if !state.matches_scope(scope) {
            debug!(
                target: "offline::lkg",
                key = %self.data_key,
                stored = state.scope.as_ref().map(ScopeKey::as_str),
                requested = scope.map(ScopeKey::as_str),
                "snapshot scope mismatch"
            );
            self.clear().await;
            return None;
        }

        Some(state)
    }

    pub async fn clear(&self) {
        for key in [&self.data_key, &self.timestamp_key] {
            if let Err(err) = self.store.remove(key).await {
                warn!(target: "offline::lkg", key = %key, error = %err, "failed to remove snapshot key");
            }
        }
    }

    /// True when no snapshot exists or it is older than `threshold`.
    pub async fn is_stale(&self, threshold: Duration) -> bool {
        match self.saved_at().await {
            Some(saved_at) => self.clock.now() - saved_at > to_chrono(threshold),
            None => true,
        }
    }

    pub async fn age(&self) -> Option<chrono::Duration> {
        self.saved_at().await.map(|saved_at| self.clock.now() - saved_at)
    }

    async fn saved_at(&self) -> Option<DateTime<Utc>> {
        load_json(self.store.as_ref(), &self.timestamp_key).await
    }
}
