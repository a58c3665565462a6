pub mod network_status;
pub mod queued_operation_id;
pub mod request_id;
pub mod scope_key;
pub mod sync_status;

pub use network_status::NetworkStatus;
pub use queued_operation_id::QueuedOperationId;
pub use request_id::RequestId;
pub use scope_key::ScopeKey;
pub use sync_status::SyncStatus;
