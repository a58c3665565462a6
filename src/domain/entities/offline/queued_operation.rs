use crate::domain::value_objects::{QueuedOperationId, SyncStatus};
use crate::shared::error::ExecutionError;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A write that an integrating feature wants to survive network loss.
///
/// Implementors are usually a tagged enum, one variant per write, e.g.
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// #[serde(tag = "operationType", content = "payload", rename_all = "snake_case")]
/// enum UserOperation {
///     UpdateUser { id: String, name: String },
///     DeleteUser { id: String },
/// }
/// ```
///
/// The queue never looks inside the value; only the matching executor does.
pub trait OfflineOperation: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable label used in logs and notices (`update_user`, `delete_property`, ...).
    fn operation_type(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation<Op> {
    pub id: QueuedOperationId,
    pub operation: Op,
    pub queued_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
    pub retry_count: u32,
    pub last_retry_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<Op> QueuedOperation<Op> {
    pub fn new(operation: Op, queued_at: DateTime<Utc>) -> Self {
        Self {
            id: QueuedOperationId::generate(),
            operation,
            queued_at,
            sync_status: SyncStatus::Pending,
            retry_count: 0,
            last_retry_at: None,
            error: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.sync_status == SyncStatus::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.sync_status == SyncStatus::Failed
    }

    /// Whether the backoff window since the last attempt has elapsed.
    pub fn is_due(&self, now: DateTime<Utc>, backoff: Duration) -> bool {
        match self.last_retry_at {
            None => true,
            Some(last) => now - last >= backoff,
        }
    }

    pub fn mark_synced(&mut self) {
        self.sync_status = SyncStatus::Synced;
        self.error = None;
    }

    /// Records one failed attempt and returns the resulting status.
    pub fn record_failure(
        &mut self,
        now: DateTime<Utc>,
        error: &ExecutionError,
        max_retries: u32,
    ) -> SyncStatus {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_retry_at = Some(now);

        if !error.is_retryable() || self.retry_count >= max_retries {
            self.sync_status = SyncStatus::Failed;
            self.error = Some(error.to_string());
        } else {
            self.sync_status = SyncStatus::Pending;
            self.error = None;
        }
        self.sync_status
    }

    /// Operator reset: back to a fresh pending entry.
    pub fn reset(&mut self) {
        self.sync_status = SyncStatus::Pending;
        self.retry_count = 0;
        self.last_retry_at = None;
        self.error = None;
    }
}

impl<Op: OfflineOperation> QueuedOperation<Op> {
    pub fn operation_type(&self) -> &str {
        self.operation.operation_type()
    }
}
