pub mod flush_report;
pub mod last_known_good;
pub mod queued_operation;
pub mod request_cache_entry;

pub use flush_report::{FlushOutcome, FlushReport, FlushTrigger};
pub use last_known_good::LastKnownGoodState;
pub use queued_operation::{OfflineOperation, QueuedOperation};
pub use request_cache_entry::{RequestCacheEntry, RequestCorrelation};
