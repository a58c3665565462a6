pub mod durable_store;
pub mod network_monitor;
pub mod operation_executor;
pub mod sync_notifier;

pub use durable_store::DurableStore;
pub use network_monitor::NetworkMonitor;
pub use operation_executor::OperationExecutor;
pub use sync_notifier::{SyncNotice, SyncNotifier};
