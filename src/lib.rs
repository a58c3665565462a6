//! Offline resilience for the ops dashboard: a durable write queue drained
//! by a retrying sync coordinator, request deduplication, and last-known-good
//! snapshots for reads.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::{
    DurableStore, NetworkMonitor, OperationExecutor, SyncNotice, SyncNotifier,
};
pub use application::services::{
    OfflineService, ReadOutcome, RetryPolicy, SubmitOutcome, SyncCoordinator, SyncWorker,
    SyncWorkerConfig, SyncWorkerHandle,
};
pub use domain::entities::{
    FlushOutcome, FlushReport, FlushTrigger, LastKnownGoodState, OfflineOperation,
    QueuedOperation, RequestCacheEntry, RequestCorrelation,
};
pub use domain::value_objects::{NetworkStatus, QueuedOperationId, RequestId, ScopeKey, SyncStatus};
pub use infrastructure::{
    BroadcastNotifier, LastKnownGoodStore, MemoryDurableStore, OfflineQueue,
    RequestDeduplicationCache, SqliteDurableStore, SyncMetricsSnapshot, TracingNotifier,
    WatchNetworkMonitor,
};
pub use shared::{AppConfig, AppError, Clock, ExecutionError, ManualClock, SystemClock};
pub use state::OfflineState;

/// Installs a fmt subscriber filtered by `RUST_LOG`
/// (default `opsdesk_offline=debug,info`). Does nothing if a global
/// subscriber is already set.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opsdesk_offline=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
