pub mod sync_notifiers;

pub use sync_notifiers::{BroadcastNotifier, TracingNotifier};
