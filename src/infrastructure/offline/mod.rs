pub mod last_known_good_store;
pub mod metrics;
pub mod offline_queue;

pub use last_known_good_store::LastKnownGoodStore;
pub use metrics::{PassOutcome, SyncMetrics, SyncMetricsSnapshot};
pub use offline_queue::OfflineQueue;
