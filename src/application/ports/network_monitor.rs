use crate::domain::value_objects::NetworkStatus;
use tokio::sync::watch;

pub trait NetworkMonitor: Send + Sync {
    fn status(&self) -> NetworkStatus;

    /// Receiver that observes every status transition.
    fn subscribe(&self) -> watch::Receiver<NetworkStatus>;

    fn is_online(&self) -> bool {
        self.status().is_online()
    }
}
