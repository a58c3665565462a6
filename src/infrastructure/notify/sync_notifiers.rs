use crate::application::ports::sync_notifier::{SyncNotice, SyncNotifier};
use tokio::sync::broadcast;
use tracing::{info, warn};

const DEFAULT_NOTICE_BUFFER: usize = 64;

/// Writes notices to the log only. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl SyncNotifier for TracingNotifier {
    fn notify(&self, notice: SyncNotice) {
        match &notice {
            SyncNotice::Synced { count } => {
                info!(target: "offline::notify", count = *count, "{notice}");
            }
            SyncNotice::Failed { count } => {
                warn!(target: "offline::notify", count = *count, "{notice}");
            }
        }
    }
}

/// Fans notices out to any number of UI listeners.
///
/// Notices sent while nobody listens are dropped; a slow listener that falls
/// more than the buffer behind loses the oldest ones.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<SyncNotice>,
}

impl BroadcastNotifier {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_BUFFER)
    }
}

impl SyncNotifier for BroadcastNotifier {
    fn notify(&self, notice: SyncNotice) {
        if self.sender.send(notice.clone()).is_err() {
            tracing::debug!(target: "offline::notify", %notice, "no listeners for sync notice");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_every_listener() {
        let notifier = BroadcastNotifier::default();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();
        assert_eq!(notifier.listener_count(), 2);

        notifier.notify(SyncNotice::Synced { count: 3 });

        assert_eq!(first.recv().await.unwrap(), SyncNotice::Synced { count: 3 });
        assert_eq!(second.recv().await.unwrap(), SyncNotice::Synced { count: 3 });
    }

    #[test]
    fn test_notify_without_listeners_is_harmless() {
        let notifier = BroadcastNotifier::new(4);
        notifier.notify(SyncNotice::Failed { count: 1 });
        TracingNotifier.notify(SyncNotice::Failed { count: 1 });
    }
}
