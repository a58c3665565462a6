use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator-facing notice emitted after a flush pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncNotice {
    Synced { count: u32 },
    Failed { count: u32 },
}

impl fmt::Display for SyncNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncNotice::Synced { count } => write!(f, "synced {count} {}", noun(*count)),
            SyncNotice::Failed { count } => write!(f, "{count} {} failed to sync", noun(*count)),
        }
    }
}

fn noun(count: u32) -> &'static str {
    if count == 1 { "operation" } else { "operations" }
}

pub trait SyncNotifier: Send + Sync {
    fn notify(&self, notice: SyncNotice);
}
