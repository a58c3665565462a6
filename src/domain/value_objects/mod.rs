pub mod offline;

pub use offline::{NetworkStatus, QueuedOperationId, RequestId, ScopeKey, SyncStatus};
