use crate::application::services::sync_coordinator::SyncCoordinator;
use crate::domain::entities::{FlushTrigger, OfflineOperation};
use crate::domain::value_objects::NetworkStatus;
use crate::shared::config::SyncConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWorkerConfig {
    pub interval: Duration,
    pub settle_delay: Duration,
}

impl SyncWorkerConfig {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            interval: config.flush_interval(),
            settle_delay: config.settle_delay(),
        }
    }
}

impl Default for SyncWorkerConfig {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

/// Stops the background worker. Dropping the handle stops it too, without
/// waiting.
pub struct SyncWorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SyncWorkerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.join.await {
            warn!(target: "offline::sync", error = %err, "sync worker ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

pub struct SyncWorker;

impl SyncWorker {
    /// Spawns the loop that feeds `coordinator.flush` from two sources: a
    /// fixed timer (first tick one full interval after start) and the
    /// transition back to online, delayed by `settle_delay` and skipped if
    /// the link dropped again meanwhile.
    pub fn spawn<Op: OfflineOperation>(
        coordinator: Arc<SyncCoordinator<Op>>,
        config: SyncWorkerConfig,
    ) -> SyncWorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // observed before the task is first polled, so a restore that lands
        // right after spawn still counts as a transition
        let mut network_rx = coordinator.network().subscribe();
        let initial = *network_rx.borrow_and_update();
        let interval = config.interval.max(Duration::from_millis(1));
        let first_tick = Instant::now() + interval;

        let worker = Worker {
            coordinator,
            settle_delay: config.settle_delay,
            interval,
            first_tick,
            network_rx,
            initial,
        };
        let join = tokio::spawn(worker.run(shutdown_rx));
        SyncWorkerHandle { shutdown_tx, join }
    }
}

struct Worker<Op> {
    coordinator: Arc<SyncCoordinator<Op>>,
    settle_delay: Duration,
    interval: Duration,
    first_tick: Instant,
    network_rx: watch::Receiver<NetworkStatus>,
    initial: NetworkStatus,
}

impl<Op: OfflineOperation> Worker<Op> {
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let Worker {
            coordinator,
            settle_delay,
            interval,
            first_tick,
            mut network_rx,
            initial,
        } = self;

        let mut ticker = tokio::time::interval_at(first_tick, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_status = initial;
        let mut watching = true;

        info!(
            target: "offline::sync",
            interval_secs = interval.as_secs(),
            settle_ms = settle_delay.as_millis() as u64,
            "sync worker started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {
                    coordinator.flush(FlushTrigger::Timer).await;
                }
                changed = network_rx.changed(), if watching => {
                    if changed.is_err() {
                        debug!(target: "offline::sync", "network monitor closed; timer only from now on");
                        watching = false;
                        continue;
                    }

                    let status = *network_rx.borrow_and_update();
                    let restored = !last_status.is_online() && status.is_online();
                    last_status = status;
                    if !restored {
                        continue;
                    }

                    let settled = tokio::select! {
                        _ = shutdown_rx.changed() => false,
                        _ = tokio::time::sleep(settle_delay) => true,
                    };
                    if !settled {
                        break;
                    }

                    if coordinator.network().is_online() {
                        coordinator.flush(FlushTrigger::NetworkRestored).await;
                    } else {
                        debug!(target: "offline::sync", "connection dropped during settle delay");
                    }
                }
            }
        }

        info!(target: "offline::sync", "sync worker stopped");
    }
}
