use crate::application::ports::network_monitor::NetworkMonitor;
use crate::domain::value_objects::NetworkStatus;
use tokio::sync::watch;
use tracing::info;

/// Network monitor fed by whatever connectivity signal the host exposes.
///
/// The host calls `set_status` on every change it observes; subscribers see
/// each distinct transition.
pub struct WatchNetworkMonitor {
    status_tx: watch::Sender<NetworkStatus>,
}

impl WatchNetworkMonitor {
    pub fn new(initial: NetworkStatus) -> Self {
        let (status_tx, _) = watch::channel(initial);
        Self { status_tx }
    }

    /// Publishes `status`; returns whether it differed from the previous one.
    pub fn set_status(&self, status: NetworkStatus) -> bool {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        if changed {
            info!(target: "offline::network", status = status.as_str(), "network status changed");
        }
        changed
    }

    pub fn set_online(&self) -> bool {
        self.set_status(NetworkStatus::Online)
    }

    pub fn set_offline(&self) -> bool {
        self.set_status(NetworkStatus::Offline)
    }
}

impl Default for WatchNetworkMonitor {
    fn default() -> Self {
        Self::new(NetworkStatus::Online)
    }
}

impl NetworkMonitor for WatchNetworkMonitor {
    fn status(&self) -> NetworkStatus {
        *self.status_tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let monitor = WatchNetworkMonitor::new(NetworkStatus::Offline);
        let mut rx = monitor.subscribe();
        assert!(!monitor.is_online());

        assert!(monitor.set_status(NetworkStatus::Reconnecting));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), NetworkStatus::Reconnecting);

        assert!(monitor.set_online());
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), NetworkStatus::Online);
        assert!(monitor.is_online());
    }

    #[test]
    fn test_repeated_status_is_not_a_transition() {
        let monitor = WatchNetworkMonitor::default();
        let rx = monitor.subscribe();
        assert!(!monitor.set_online());
        assert!(!rx.has_changed().unwrap());
    }
}
