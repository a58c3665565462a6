use crate::domain::value_objects::ScopeKey;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastKnownGoodState<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub scope: Option<ScopeKey>,
}

impl<T> LastKnownGoodState<T> {
    pub fn new(data: T, timestamp: DateTime<Utc>, scope: Option<ScopeKey>) -> Self {
        Self {
            data,
            timestamp,
            scope,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    pub fn is_expired(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        self.age(now) > expiry
    }

    pub fn matches_scope(&self, requested: Option<&ScopeKey>) -> bool {
        ScopeKey::compatible(self.scope.as_ref(), requested)
    }
}
