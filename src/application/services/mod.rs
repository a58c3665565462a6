pub mod offline_service;
pub mod sync_coordinator;
pub mod sync_worker;

pub use offline_service::{OfflineService, ReadOutcome, SubmitOutcome};
pub use sync_coordinator::{RetryPolicy, SyncCoordinator};
pub use sync_worker::{SyncWorker, SyncWorkerConfig, SyncWorkerHandle};
