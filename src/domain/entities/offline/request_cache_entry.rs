use crate::domain::value_objects::RequestId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied context kept next to an idempotency key. Diagnostic only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestCorrelation {
    pub operation: Option<String>,
    pub entity_id: Option<String>,
    pub metadata: Option<Value>,
}

impl RequestCorrelation {
    pub fn new(operation: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            entity_id: Some(entity_id.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestCacheEntry {
    pub request_id: RequestId,
    pub timestamp: DateTime<Utc>,
    pub correlation: RequestCorrelation,
}

impl RequestCacheEntry {
    pub fn new(request_id: RequestId, timestamp: DateTime<Utc>, correlation: RequestCorrelation) -> Self {
        Self {
            request_id,
            timestamp,
            correlation,
        }
    }

    /// Live while `now - timestamp <= ttl`.
    pub fn is_live(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.timestamp <= ttl
    }
}
