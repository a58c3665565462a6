use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            AppError::DeserializationError(err.to_string())
        } else {
            AppError::SerializationError(err.to_string())
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure reported by an operation executor.
///
/// `Rejected` marks a definitive refusal (validation error, missing entity)
/// and is never retried; `Transient` follows the backoff policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ExecutionError {
    pub fn transient(message: impl Into<String>) -> Self {
        ExecutionError::Transient(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        ExecutionError::Rejected(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutionError::Transient(_))
    }
}

impl From<AppError> for ExecutionError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::ValidationError(msg) | AppError::NotFound(msg) => {
                ExecutionError::Rejected(msg)
            }
            other => ExecutionError::Transient(other.to_string()),
        }
    }
}
