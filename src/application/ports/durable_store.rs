use crate::shared::error::AppError;
use async_trait::async_trait;

/// Local key-value persistence that survives restarts.
///
/// Values are JSON documents stored as strings. Each component owns a fixed
/// key (or key prefix) and never writes outside of it.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
