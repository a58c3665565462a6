use crate::application::ports::{DurableStore, NetworkMonitor, OperationExecutor, SyncNotifier};
use crate::application::services::{
    OfflineService, RetryPolicy, SyncCoordinator, SyncWorker, SyncWorkerConfig, SyncWorkerHandle,
};
use crate::domain::entities::OfflineOperation;
use crate::infrastructure::cache::RequestDeduplicationCache;
use crate::infrastructure::offline::{LastKnownGoodStore, OfflineQueue};
use crate::infrastructure::storage::{MemoryDurableStore, SqliteDurableStore};
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Everything the host needs, wired from one `AppConfig`.
pub struct OfflineState<Op> {
    pub config: AppConfig,
    pub store: Arc<dyn DurableStore>,
    pub queue: Arc<OfflineQueue<Op>>,
    pub coordinator: Arc<SyncCoordinator<Op>>,
    pub dedup: Arc<RequestDeduplicationCache>,
    pub service: Arc<OfflineService<Op>>,
    clock: Arc<dyn Clock>,
    worker: Mutex<Option<SyncWorkerHandle>>,
}

impl<Op: OfflineOperation> OfflineState<Op> {
    /// Opens the configured store (SQLite unless `storage.in_memory`) and
    /// starts the sync worker when `sync.auto_sync` is set.
    pub async fn new(
        config: AppConfig,
        executor: Arc<dyn OperationExecutor<Op>>,
        network: Arc<dyn NetworkMonitor>,
        notifier: Arc<dyn SyncNotifier>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let store: Arc<dyn DurableStore> = if config.storage.in_memory {
            Arc::new(MemoryDurableStore::new())
        } else {
            Arc::new(
                SqliteDurableStore::connect(
                    &config.storage.database_url,
                    config.storage.max_connections,
                )
                .await?,
            )
        };

        Self::with_store(config, store, executor, network, notifier, Arc::new(SystemClock)).await
    }

    pub async fn with_store(
        config: AppConfig,
        store: Arc<dyn DurableStore>,
        executor: Arc<dyn OperationExecutor<Op>>,
        network: Arc<dyn NetworkMonitor>,
        notifier: Arc<dyn SyncNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let queue = Arc::new(
            OfflineQueue::open_with_clock(store.clone(), config.sync.queue_capacity, clock.clone())
                .await,
        );
        let coordinator = Arc::new(
            SyncCoordinator::new(
                queue.clone(),
                executor,
                network,
                notifier,
                RetryPolicy::from_config(&config.sync),
            )
            .with_clock(clock.clone()),
        );
        let dedup = Arc::new(RequestDeduplicationCache::with_clock(
            config.dedup.ttl(),
            config.dedup.capacity,
            clock.clone(),
        ));
        let service = Arc::new(OfflineService::new(coordinator.clone(), dedup.clone()));

        let state = Self {
            config,
            store,
            queue,
            coordinator,
            dedup,
            service,
            clock,
            worker: Mutex::new(None),
        };

        if state.config.sync.auto_sync {
            state.start_worker().await;
        }

        info!(
            target: "offline::state",
            queued = state.queue.size().await,
            auto_sync = state.config.sync.auto_sync,
            "offline state ready"
        );
        Ok(state)
    }

    /// Snapshot store for one data set, using the configured expiry.
    pub fn snapshot_store<T>(&self, namespace: &str) -> LastKnownGoodStore<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        LastKnownGoodStore::with_options(
            self.store.clone(),
            namespace,
            self.config.snapshot.expiry(),
            self.clock.clone(),
        )
    }

    /// Returns `false` when a worker is already running.
    pub async fn start_worker(&self) -> bool {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return false;
        }
        *worker = Some(SyncWorker::spawn(
            self.coordinator.clone(),
            SyncWorkerConfig::from_config(&self.config.sync),
        ));
        true
    }

    pub async fn is_worker_running(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    pub async fn shutdown(&self) {
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }
}
