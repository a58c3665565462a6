use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub dedup: DedupConfig,
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Keep everything in process memory (no SQLite file).
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub flush_interval_secs: u64,
    pub settle_delay_ms: u64,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub expiry_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                database_url: "sqlite:data/opsdesk-offline.db".to_string(),
                max_connections: 1,
                in_memory: false,
            },
            sync: SyncConfig::default(),
            dedup: DedupConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            flush_interval_secs: 60,
            settle_delay_ms: 2_000,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_retries: 5,
            queue_capacity: 100,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300, // 5 minutes
            capacity: 1000,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            expiry_secs: 24 * 60 * 60,
        }
    }
}

impl SyncConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl DedupConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl SnapshotConfig {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("OPSDESK_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.storage.database_url = trimmed.to_string();
            }
        }
        if let Some(value) = env_parsed("OPSDESK_DATABASE_MAX_CONNECTIONS", parse_u32) {
            cfg.storage.max_connections = value.max(1);
        }
        if let Ok(v) = std::env::var("OPSDESK_STORAGE_IN_MEMORY") {
            cfg.storage.in_memory = parse_bool(&v, cfg.storage.in_memory);
        }

        if let Ok(v) = std::env::var("OPSDESK_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_parsed("OPSDESK_SYNC_INTERVAL_SECS", parse_u64) {
            cfg.sync.flush_interval_secs = value.max(1);
        }
        if let Some(value) = env_parsed("OPSDESK_SYNC_SETTLE_DELAY_MS", parse_u64) {
            cfg.sync.settle_delay_ms = value;
        }
        if let Some(value) = env_parsed("OPSDESK_SYNC_BASE_DELAY_MS", parse_u64) {
            cfg.sync.base_delay_ms = value;
        }
        if let Some(value) = env_parsed("OPSDESK_SYNC_MAX_DELAY_MS", parse_u64) {
            cfg.sync.max_delay_ms = value;
        }
        if let Some(value) = env_parsed("OPSDESK_SYNC_MAX_RETRIES", parse_u32) {
            cfg.sync.max_retries = value.max(1);
        }
        if let Some(value) = env_parsed("OPSDESK_QUEUE_CAPACITY", parse_usize) {
            cfg.sync.queue_capacity = value.max(1);
        }

        if let Some(value) = env_parsed("OPSDESK_DEDUP_TTL_SECS", parse_u64) {
            cfg.dedup.ttl_secs = value;
        }
        if let Some(value) = env_parsed("OPSDESK_DEDUP_CAPACITY", parse_usize) {
            cfg.dedup.capacity = value.max(1);
        }

        if let Some(value) = env_parsed("OPSDESK_SNAPSHOT_EXPIRY_SECS", parse_u64) {
            cfg.snapshot.expiry_secs = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.storage.in_memory && self.storage.database_url.trim().is_empty() {
            return Err("Storage database_url must not be empty".to_string());
        }
        if self.storage.max_connections == 0 {
            return Err("Storage max_connections must be greater than 0".to_string());
        }
        if self.sync.flush_interval_secs == 0 {
            return Err("Sync flush_interval_secs must be greater than 0".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.sync.base_delay_ms > self.sync.max_delay_ms {
            return Err("Sync base_delay_ms must not exceed max_delay_ms".to_string());
        }
        if self.sync.queue_capacity == 0 {
            return Err("Sync queue_capacity must be greater than 0".to_string());
        }
        if self.dedup.capacity == 0 {
            return Err("Dedup capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn env_parsed<T>(name: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    std::env::var(name).ok().and_then(|v| parse(&v))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}
