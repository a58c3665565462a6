pub mod offline;

pub use offline::{
    FlushOutcome, FlushReport, FlushTrigger, LastKnownGoodState, OfflineOperation,
    QueuedOperation, RequestCacheEntry, RequestCorrelation,
};
