use crate::shared::error::ExecutionError;
use async_trait::async_trait;

/// Maps a queued operation to the API call that applies it.
///
/// Implementations are expected to carry their own request timeout and to
/// always resolve. Returning `ExecutionError::Rejected` stops retries for the
/// entry immediately.
#[async_trait]
pub trait OperationExecutor<Op>: Send + Sync {
    async fn execute(&self, operation: &Op) -> Result<(), ExecutionError>;
}
