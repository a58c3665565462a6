use crate::application::ports::durable_store::DurableStore;
use crate::shared::error::AppError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Reads and parses the JSON document under `key`.
///
/// Absent, unreadable and unparseable values all come back as `None`; the
/// latter two are logged. A corrupt value is left in place and gets replaced
/// by the next successful write.
pub async fn load_json<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(target: "offline::storage", key, error = %err, "failed to read durable key");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                target: "offline::storage",
                key,
                error = %err,
                "discarding unparseable durable value"
            );
            None
        }
    }
}

pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn DurableStore,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let json = serde_json::to_string(value)
        .map_err(|err| AppError::SerializationError(err.to_string()))?;
    store.set(key, &json).await
}
