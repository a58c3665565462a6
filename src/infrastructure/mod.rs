pub mod cache;
pub mod network;
pub mod notify;
pub mod offline;
pub mod storage;

pub use cache::RequestDeduplicationCache;
pub use network::WatchNetworkMonitor;
pub use notify::{BroadcastNotifier, TracingNotifier};
pub use offline::{LastKnownGoodStore, OfflineQueue, SyncMetrics, SyncMetricsSnapshot};
pub use storage::{MemoryDurableStore, SqliteDurableStore};
