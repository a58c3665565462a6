use crate::application::services::sync_coordinator::SyncCoordinator;
use crate::domain::entities::{
    FlushOutcome, FlushTrigger, LastKnownGoodState, OfflineOperation, RequestCorrelation,
};
use crate::domain::value_objects::{QueuedOperationId, RequestId, ScopeKey};
use crate::infrastructure::cache::RequestDeduplicationCache;
use crate::infrastructure::offline::LastKnownGoodStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A live entry for the request id exists; nothing was queued.
    Duplicate,
    Queued {
        id: QueuedOperationId,
        flush: FlushOutcome,
    },
}

impl SubmitOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, SubmitOutcome::Duplicate)
    }

    pub fn queued_id(&self) -> Option<&QueuedOperationId> {
        match self {
            SubmitOutcome::Queued { id, .. } => Some(id),
            SubmitOutcome::Duplicate => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    Live(T),
    /// Served from the last successful read; callers should flag it as stale.
    Fallback(LastKnownGoodState<T>),
}

impl<T> ReadOutcome<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ReadOutcome::Fallback(_))
    }

    pub fn into_data(self) -> T {
        match self {
            ReadOutcome::Live(data) => data,
            ReadOutcome::Fallback(state) => state.data,
        }
    }
}

/// Entry point for feature code: writes go through `submit`, reads through
/// `read_through`.
pub struct OfflineService<Op> {
    coordinator: Arc<SyncCoordinator<Op>>,
    dedup: Arc<RequestDeduplicationCache>,
}

impl<Op: OfflineOperation> OfflineService<Op> {
    pub fn new(coordinator: Arc<SyncCoordinator<Op>>, dedup: Arc<RequestDeduplicationCache>) -> Self {
        Self { coordinator, dedup }
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator<Op>> {
        &self.coordinator
    }

    pub fn dedup(&self) -> &Arc<RequestDeduplicationCache> {
        &self.dedup
    }

    /// Queues `operation` and, when online, flushes right away.
    ///
    /// With a `request_id`, a resend inside the dedup window is dropped and
    /// reported as `Duplicate`.
    pub async fn submit(
        &self,
        operation: Op,
        request_id: Option<RequestId>,
        correlation: RequestCorrelation,
    ) -> SubmitOutcome {
        if let Some(request_id) = request_id {
            let label = request_id.to_string();
            if !self.dedup.record_if_new(request_id, correlation).await {
                info!(
                    target: "offline::dedup",
                    request_id = %label,
                    operation_type = operation.operation_type(),
                    "dropping duplicate request"
                );
                return SubmitOutcome::Duplicate;
            }
        }

        let id = self.coordinator.queue().enqueue(operation).await;
        let flush = self.coordinator.flush(FlushTrigger::Enqueue).await;
        SubmitOutcome::Queued { id, flush }
    }

    /// Forgets `request_id` so the caller may submit it again after a
    /// failure it has confirmed.
    pub async fn confirm_failed_request(&self, request_id: &RequestId) -> bool {
        self.dedup.clear_request(request_id).await
    }

    pub async fn flush(&self) -> FlushOutcome {
        self.coordinator.flush(FlushTrigger::Manual).await
    }

    pub async fn retry_failed(&self) -> FlushOutcome {
        self.coordinator.retry_failed().await
    }

    pub async fn pending_count(&self) -> usize {
        self.coordinator.queue().pending().await.len()
    }

    /// Live read with fallback to the last known good snapshot.
    ///
    /// A successful fetch refreshes the snapshot. While not online and a
    /// compatible snapshot exists, the fetch is skipped.
    pub async fn read_through<T, F, Fut, E>(
        &self,
        cache: &LastKnownGoodStore<T>,
        scope: Option<&ScopeKey>,
        fetch: F,
    ) -> Result<ReadOutcome<T>, E>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if !self.coordinator.network().is_online() {
            if let Some(state) = cache.get(scope).await {
                return Ok(ReadOutcome::Fallback(state));
            }
        }

        match fetch().await {
            Ok(data) => {
                if let Err(err) = cache.save(data.clone(), scope.cloned()).await {
                    warn!(
                        target: "offline::lkg",
                        key = cache.key(),
                        error = %err,
                        "failed to refresh last known good state"
                    );
                }
                Ok(ReadOutcome::Live(data))
            }
            Err(err) => match cache.get(scope).await {
                Some(state) => {
                    warn!(
                        target: "offline::lkg",
                        key = cache.key(),
                        error = %err,
                        "live read failed; serving last known good state"
                    );
                    Ok(ReadOutcome::Fallback(state))
                }
                None => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::operation_executor::OperationExecutor;
    use crate::application::services::sync_coordinator::RetryPolicy;
    use crate::domain::value_objects::NetworkStatus;
    use crate::infrastructure::network::WatchNetworkMonitor;
    use crate::infrastructure::notify::TracingNotifier;
    use crate::infrastructure::offline::OfflineQueue;
    use crate::infrastructure::storage::MemoryDurableStore;
    use crate::shared::error::ExecutionError;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "operationType", content = "payload", rename_all = "snake_case")]
    enum TestOp {
        CloseWorkOrder { id: String },
    }

    impl OfflineOperation for TestOp {
        fn operation_type(&self) -> &str {
            "close_work_order"
        }
    }

    #[derive(Default)]
    struct CountingExecutor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OperationExecutor<TestOp> for CountingExecutor {
        async fn execute(&self, _operation: &TestOp) -> Result<(), ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        service: OfflineService<TestOp>,
        network: Arc<WatchNetworkMonitor>,
        executor: Arc<CountingExecutor>,
        store: Arc<MemoryDurableStore>,
    }

    async fn fixture(initial: NetworkStatus) -> Fixture {
        let store = Arc::new(MemoryDurableStore::new());
        let queue = Arc::new(OfflineQueue::open(store.clone(), 100).await);
        let network = Arc::new(WatchNetworkMonitor::new(initial));
        let executor = Arc::new(CountingExecutor::default());
        let coordinator = Arc::new(SyncCoordinator::new(
            queue,
            executor.clone(),
            network.clone(),
            Arc::new(TracingNotifier),
            RetryPolicy::default(),
        ));
        let service = OfflineService::new(coordinator, Arc::new(RequestDeduplicationCache::default()));
        Fixture {
            service,
            network,
            executor,
            store,
        }
    }

    fn close(id: &str) -> TestOp {
        TestOp::CloseWorkOrder { id: id.into() }
    }

    fn request(id: &str) -> Option<RequestId> {
        Some(RequestId::new(id).unwrap())
    }

    #[tokio::test]
    async fn test_submit_online_flushes_immediately() {
        let f = fixture(NetworkStatus::Online).await;
        let outcome = f
            .service
            .submit(close("wo-1"), request("req-1"), RequestCorrelation::new("close_work_order", "wo-1"))
            .await;

        match outcome {
            SubmitOutcome::Queued { flush, .. } => assert_eq!(flush.synced_count(), 1),
            SubmitOutcome::Duplicate => panic!("first submission is not a duplicate"),
        }
        assert_eq!(f.executor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.service.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_resend_is_dropped_until_confirmed() {
        let f = fixture(NetworkStatus::Offline).await;
        let key = request("req-1");

        let first = f
            .service
            .submit(close("wo-1"), key.clone(), RequestCorrelation::default())
            .await;
        assert!(first.queued_id().is_some());
        assert!(matches!(
            first,
            SubmitOutcome::Queued {
                flush: FlushOutcome::Offline,
                ..
            }
        ));

        let resend = f
            .service
            .submit(close("wo-1"), key.clone(), RequestCorrelation::default())
            .await;
        assert!(resend.is_duplicate());
        assert_eq!(f.service.pending_count().await, 1);

        assert!(f.service.confirm_failed_request(key.as_ref().unwrap()).await);
        let retried = f.service.submit(close("wo-1"), key, RequestCorrelation::default()).await;
        assert!(!retried.is_duplicate());
        assert_eq!(f.service.pending_count().await, 2);
    }

    #[tokio::test]
    async fn test_submit_without_request_id_never_dedups() {
        let f = fixture(NetworkStatus::Offline).await;
        f.service.submit(close("wo-1"), None, RequestCorrelation::default()).await;
        f.service.submit(close("wo-1"), None, RequestCorrelation::default()).await;
        assert_eq!(f.service.pending_count().await, 2);
        assert!(f.service.dedup().is_empty().await);
    }

    #[tokio::test]
    async fn test_read_through_saves_and_falls_back() {
        let f = fixture(NetworkStatus::Online).await;
        let cache: LastKnownGoodStore<Vec<String>> =
            LastKnownGoodStore::new(f.store.clone(), "work_orders");
        let scope = ScopeKey::new("property-A").unwrap();

        let live = f
            .service
            .read_through(&cache, Some(&scope), || async {
                Ok::<_, String>(vec!["wo-1".to_string()])
            })
            .await
            .unwrap();
        assert_eq!(live, ReadOutcome::Live(vec!["wo-1".to_string()]));

        let fallback = f
            .service
            .read_through(&cache, Some(&scope), || async {
                Err::<Vec<String>, _>("502 bad gateway".to_string())
            })
            .await
            .unwrap();
        assert!(fallback.is_fallback());
        assert_eq!(fallback.into_data(), vec!["wo-1".to_string()]);
    }

    #[tokio::test]
    async fn test_read_through_surfaces_error_without_snapshot() {
        let f = fixture(NetworkStatus::Online).await;
        let cache: LastKnownGoodStore<Vec<String>> =
            LastKnownGoodStore::new(f.store.clone(), "work_orders");

        let result = f
            .service
            .read_through(&cache, None, || async {
                Err::<Vec<String>, _>("timeout".to_string())
            })
            .await;
        assert_eq!(result.unwrap_err(), "timeout");
    }

    #[tokio::test]
    async fn test_read_through_skips_fetch_while_offline() {
        let f = fixture(NetworkStatus::Online).await;
        let cache: LastKnownGoodStore<Vec<String>> =
            LastKnownGoodStore::new(f.store.clone(), "work_orders");
        cache.save(vec!["wo-9".to_string()], None).await.unwrap();

        f.network.set_offline();
        let fetched = AtomicUsize::new(0);
        let outcome = f
            .service
            .read_through(&cache, None, || async {
                fetched.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(vec![])
            })
            .await
            .unwrap();

        assert!(outcome.is_fallback());
        assert_eq!(fetched.load(Ordering::SeqCst), 0);
    }
}
