use crate::application::ports::durable_store::DurableStore;
use crate::domain::entities::{OfflineOperation, QueuedOperation};
use crate::domain::value_objects::{QueuedOperationId, SyncStatus};
use crate::infrastructure::storage::{load_json, save_json};
use crate::shared::clock::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const OFFLINE_QUEUE_KEY: &str = "offline_queue";
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Durable FIFO of writes waiting for connectivity.
///
/// The in-memory list is authoritative for the session. Every mutation is
/// written through to `offline_queue` as one JSON array; a failed write is
/// logged and the next successful one catches up.
pub struct OfflineQueue<Op> {
    store: Arc<dyn DurableStore>,
    entries: Mutex<Vec<QueuedOperation<Op>>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl<Op: OfflineOperation> OfflineQueue<Op> {
    pub async fn open(store: Arc<dyn DurableStore>, capacity: usize) -> Self {
        Self::open_with_clock(store, capacity, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(
        store: Arc<dyn DurableStore>,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let entries: Vec<QueuedOperation<Op>> =
            load_json(store.as_ref(), OFFLINE_QUEUE_KEY).await.unwrap_or_default();

        debug!(
            target: "offline::queue",
            restored = entries.len(),
            capacity,
            "offline queue hydrated"
        );

        Self {
            store,
            entries: Mutex::new(entries),
            capacity: capacity.max(1),
            clock,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a pending entry. Never fails: when the store rejects the write
    /// the entry is still kept in memory for this session.
    pub async fn enqueue(&self, operation: Op) -> QueuedOperationId {
        let entry = QueuedOperation::new(operation, self.clock.now());
        let id = entry.id.clone();
        let operation_type = entry.operation_type().to_string();

        let mut entries = self.entries.lock().await;
        entries.push(entry);

        if entries.len() > self.capacity {
            let overflow = entries.len() - self.capacity;
            let dropped: Vec<_> = entries.drain(..overflow).collect();
            for entry in &dropped {
                warn!(
                    target: "offline::queue",
                    id = %entry.id,
                    operation_type = entry.operation_type(),
                    status = %entry.sync_status,
                    capacity = self.capacity,
                    "queue over capacity, dropping oldest operation"
                );
            }
        }

        self.persist(&entries).await;
        info!(
            target: "offline::queue",
            id = %id,
            operation_type = %operation_type,
            size = entries.len(),
            "operation queued"
        );
        id
    }

    /// Snapshot in insertion order.
    pub async fn get_queue(&self) -> Vec<QueuedOperation<Op>> {
        self.entries.lock().await.clone()
    }

    pub async fn size(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn pending(&self) -> Vec<QueuedOperation<Op>> {
        self.filtered(SyncStatus::Pending).await
    }

    pub async fn failed(&self) -> Vec<QueuedOperation<Op>> {
        self.filtered(SyncStatus::Failed).await
    }

    pub async fn get(&self, id: &QueuedOperationId) -> Option<QueuedOperation<Op>> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|entry| &entry.id == id)
            .cloned()
    }

    /// Operator discard of a single entry, whatever its status.
    pub async fn remove(&self, id: &QueuedOperationId) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| &entry.id != id);
        if entries.len() == before {
            return false;
        }
        self.persist(&entries).await;
        true
    }

    /// Empties the queue. When the key cannot be removed an empty list is
    /// written over it instead; if the store rejects that too, the old list
    /// stays on disk until the next successful write.
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
        if let Err(err) = self.store.remove(OFFLINE_QUEUE_KEY).await {
            warn!(
                target: "offline::queue",
                error = %err,
                "failed to remove persisted queue; overwriting with an empty list"
            );
            self.persist(&entries).await;
        }
    }

    /// Moves every failed entry back to a fresh pending state.
    pub async fn reset_failed(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let mut reset = 0;
        for entry in entries.iter_mut().filter(|entry| entry.is_failed()) {
            entry.reset();
            reset += 1;
        }
        if reset > 0 {
            self.persist(&entries).await;
        }
        reset
    }

    /// Replaces the in-memory list with what the store currently holds.
    pub async fn reload(&self) -> usize {
        let loaded: Vec<QueuedOperation<Op>> =
            load_json(self.store.as_ref(), OFFLINE_QUEUE_KEY).await.unwrap_or_default();
        let mut entries = self.entries.lock().await;
        *entries = loaded;
        entries.len()
    }

    /// Writes back the result of a flush pass.
    ///
    /// Entries are matched by id: synced ones are dropped, the rest replace
    /// their stored copy. Ids that vanished meanwhile (operator discard,
    /// capacity trim) stay gone, and entries appended during the pass are
    /// left untouched.
    pub async fn apply_outcomes(&self, outcomes: Vec<QueuedOperation<Op>>) {
        if outcomes.is_empty() {
            return;
        }

        let mut updates: HashMap<QueuedOperationId, QueuedOperation<Op>> = outcomes
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();

        let mut entries = self.entries.lock().await;
        let current = std::mem::take(&mut *entries);
        *entries = current
            .into_iter()
            .filter_map(|entry| match updates.remove(&entry.id) {
                Some(updated) if updated.sync_status == SyncStatus::Synced => None,
                Some(updated) => Some(updated),
                None => Some(entry),
            })
            .collect();

        self.persist(&entries).await;
    }

    async fn filtered(&self, status: SyncStatus) -> Vec<QueuedOperation<Op>> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.sync_status == status)
            .cloned()
            .collect()
    }

    async fn persist(&self, entries: &[QueuedOperation<Op>]) {
        if let Err(err) = save_json(self.store.as_ref(), OFFLINE_QUEUE_KEY, entries).await {
            warn!(
                target: "offline::queue",
                error = %err,
                size = entries.len(),
                "failed to persist offline queue; keeping entries in memory"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryDurableStore;
    use crate::shared::error::{AppError, ExecutionError};
    use async_trait::async_trait;
    use mockall::mock;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "operationType", content = "payload", rename_all = "snake_case")]
    enum TestOp {
        UpdateUser { id: String, name: String },
        CloseWorkOrder { id: String },
    }

    impl OfflineOperation for TestOp {
        fn operation_type(&self) -> &str {
            match self {
                TestOp::UpdateUser { .. } => "update_user",
                TestOp::CloseWorkOrder { .. } => "close_work_order",
            }
        }
    }

    mock! {
        pub Store {}

        #[async_trait]
        impl DurableStore for Store {
            async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
            async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
            async fn remove(&self, key: &str) -> Result<(), AppError>;
        }
    }

    fn update(id: &str) -> TestOp {
        TestOp::UpdateUser {
            id: id.into(),
            name: "Jane".into(),
        }
    }

    async fn queue_on(store: Arc<MemoryDurableStore>, capacity: usize) -> OfflineQueue<TestOp> {
        OfflineQueue::open(store, capacity).await
    }

    #[tokio::test]
    async fn test_enqueue_preserves_order_and_persists() {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = queue_on(store.clone(), 10).await;

        queue.enqueue(update("1")).await;
        queue.enqueue(TestOp::CloseWorkOrder { id: "wo-9".into() }).await;

        let entries = queue.get_queue().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, update("1"));
        assert_eq!(entries[1].operation_type(), "close_work_order");
        assert!(entries.iter().all(|entry| entry.is_pending() && entry.retry_count == 0));

        let reopened = queue_on(store, 10).await;
        assert_eq!(reopened.get_queue().await, entries);
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = queue_on(store, 3).await;

        for i in 0..5 {
            queue.enqueue(update(&i.to_string())).await;
        }

        let ids: Vec<TestOp> = queue.get_queue().await.into_iter().map(|e| e.operation).collect();
        assert_eq!(ids, vec![update("2"), update("3"), update("4")]);
    }

    #[tokio::test]
    async fn test_corrupt_queue_hydrates_empty() {
        let store = Arc::new(MemoryDurableStore::new());
        store.set(OFFLINE_QUEUE_KEY, "[{\"id\":").await.unwrap();

        let queue = queue_on(store.clone(), 10).await;
        assert_eq!(queue.size().await, 0);

        // the next write replaces the corrupt value
        queue.enqueue(update("1")).await;
        let reopened = queue_on(store, 10).await;
        assert_eq!(reopened.size().await, 1);
    }

    #[tokio::test]
    async fn test_enqueue_survives_storage_failure() {
        let mut store = MockStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .times(1)
            .returning(|_, _| Err(AppError::Storage("storage quota exceeded".into())));

        let queue: OfflineQueue<TestOp> = OfflineQueue::open(Arc::new(store), 10).await;
        let id = queue.enqueue(update("42")).await;

        assert_eq!(queue.size().await, 1);
        assert!(queue.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_failed_write_is_caught_up_by_next_success() {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = queue_on(store.clone(), 10).await;

        store.fail_writes(true);
        queue.enqueue(update("1")).await;
        store.fail_writes(false);
        queue.enqueue(update("2")).await;

        let reopened = queue_on(store, 10).await;
        assert_eq!(reopened.size().await, 2);
    }

    #[tokio::test]
    async fn test_apply_outcomes_keeps_entries_enqueued_mid_pass() {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = queue_on(store.clone(), 10).await;
        queue.enqueue(update("1")).await;
        queue.enqueue(update("2")).await;

        let mut snapshot = queue.get_queue().await;
        queue.enqueue(update("3")).await;

        snapshot[0].mark_synced();
        snapshot[1].record_failure(chrono::Utc::now(), &ExecutionError::transient("timeout"), 5);
        queue.apply_outcomes(snapshot).await;

        let entries = queue.get_queue().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, update("2"));
        assert_eq!(entries[0].retry_count, 1);
        assert_eq!(entries[1].operation, update("3"));
        assert_eq!(entries[1].retry_count, 0);

        let reopened = queue_on(store, 10).await;
        assert_eq!(reopened.get_queue().await, entries);
    }

    #[tokio::test]
    async fn test_apply_outcomes_does_not_resurrect_removed_entries() {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = queue_on(store, 10).await;
        let id = queue.enqueue(update("1")).await;

        let mut snapshot = queue.get_queue().await;
        assert!(queue.remove(&id).await);

        snapshot[0].record_failure(chrono::Utc::now(), &ExecutionError::transient("timeout"), 5);
        queue.apply_outcomes(snapshot).await;
        assert_eq!(queue.size().await, 0);
    }

    #[tokio::test]
    async fn test_reset_failed_and_filters() {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = queue_on(store, 10).await;
        queue.enqueue(update("1")).await;
        queue.enqueue(update("2")).await;

        let mut snapshot = queue.get_queue().await;
        snapshot[0].record_failure(chrono::Utc::now(), &ExecutionError::rejected("invalid"), 5);
        queue.apply_outcomes(snapshot).await;

        assert_eq!(queue.failed().await.len(), 1);
        assert_eq!(queue.pending().await.len(), 1);

        assert_eq!(queue.reset_failed().await, 1);
        assert!(queue.failed().await.is_empty());
        let entries = queue.get_queue().await;
        assert!(entries.iter().all(|entry| entry.retry_count == 0 && entry.error.is_none()));
    }

    #[tokio::test]
    async fn test_clear_overwrites_when_remove_fails() {
        let mut store = MockStore::new();
        let mut seq = mockall::Sequence::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store
            .expect_remove()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::Storage("database is locked".into())));
        store
            .expect_set()
            .withf(|key, value| key.to_string() == OFFLINE_QUEUE_KEY && value.to_string() == "[]")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let queue: OfflineQueue<TestOp> = OfflineQueue::open(Arc::new(store), 10).await;
        queue.enqueue(update("1")).await;
        queue.clear().await;
        assert_eq!(queue.size().await, 0);
    }

    #[tokio::test]
    async fn test_cleared_queue_stays_empty_after_restart() {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = queue_on(store.clone(), 10).await;
        queue.enqueue(update("1")).await;

        store.fail_writes(true);
        queue.clear().await;
        store.fail_writes(false);
        queue.enqueue(update("2")).await;

        let reopened = queue_on(store, 10).await;
        let entries = reopened.get_queue().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, update("2"));
    }

    #[tokio::test]
    async fn test_clear_and_reload() {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = queue_on(store.clone(), 10).await;
        queue.enqueue(update("1")).await;

        queue.clear().await;
        assert_eq!(queue.size().await, 0);
        assert!(store.get(OFFLINE_QUEUE_KEY).await.unwrap().is_none());

        let other = queue_on(store.clone(), 10).await;
        other.enqueue(update("2")).await;
        assert_eq!(queue.reload().await, 1);
    }
}
