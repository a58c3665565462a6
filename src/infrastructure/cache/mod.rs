pub mod request_dedup_cache;

pub use request_dedup_cache::RequestDeduplicationCache;
