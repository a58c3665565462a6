use crate::application::ports::network_monitor::NetworkMonitor;
use crate::application::ports::operation_executor::OperationExecutor;
use crate::application::ports::sync_notifier::{SyncNotice, SyncNotifier};
use crate::domain::entities::{FlushOutcome, FlushReport, FlushTrigger, OfflineOperation};
use crate::domain::value_objects::SyncStatus;
use crate::infrastructure::offline::{OfflineQueue, SyncMetrics, SyncMetricsSnapshot};
use crate::shared::clock::{Clock, SystemClock, to_chrono};
use crate::shared::config::SyncConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Exponential backoff with a ceiling on attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            max_retries: config.max_retries,
        }
    }

    /// `min(base * 2^retry_count, max)`, saturating instead of overflowing.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let factor = 2u32.checked_pow(retry_count).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drains the offline queue through the executor.
///
/// Entries move `pending -> synced` (removed), `pending -> pending` while
/// under the retry ceiling, or `pending -> failed` on the ceiling or a
/// rejection. Only `retry_failed` brings a failed entry back.
pub struct SyncCoordinator<Op> {
    queue: Arc<OfflineQueue<Op>>,
    executor: Arc<dyn OperationExecutor<Op>>,
    network: Arc<dyn NetworkMonitor>,
    notifier: Arc<dyn SyncNotifier>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    in_flight: AtomicBool,
    metrics: SyncMetrics,
}

impl<Op: OfflineOperation> SyncCoordinator<Op> {
    pub fn new(
        queue: Arc<OfflineQueue<Op>>,
        executor: Arc<dyn OperationExecutor<Op>>,
        network: Arc<dyn NetworkMonitor>,
        notifier: Arc<dyn SyncNotifier>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            executor,
            network,
            notifier,
            policy,
            clock: Arc::new(SystemClock),
            in_flight: AtomicBool::new(false),
            metrics: SyncMetrics::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn queue(&self) -> &Arc<OfflineQueue<Op>> {
        &self.queue
    }

    pub fn network(&self) -> &Arc<dyn NetworkMonitor> {
        &self.network
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_flushing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one pass over the pending entries.
    ///
    /// No-op while not online, and while another pass is in flight.
    pub async fn flush(&self, trigger: FlushTrigger) -> FlushOutcome {
        if !self.network.is_online() {
            debug!(
                target: "offline::sync",
                trigger = trigger.as_str(),
                status = self.network.status().as_str(),
                "skipping flush while not online"
            );
            return FlushOutcome::Offline;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!(target: "offline::sync", trigger = trigger.as_str(), "flush already running");
            return FlushOutcome::AlreadyRunning;
        };

        let started = Instant::now();
        let mut report = FlushReport::new(trigger);
        let mut outcomes = Vec::new();

        for mut entry in self.queue.get_queue().await {
            if !entry.is_pending() {
                continue;
            }

            let backoff = self.policy.backoff(entry.retry_count);
            if !entry.is_due(self.clock.now(), to_chrono(backoff)) {
                report.deferred += 1;
                continue;
            }

            if !self.network.is_online() {
                debug!(
                    target: "offline::sync",
                    attempted = report.attempted,
                    "connection lost mid-pass; leaving remaining entries queued"
                );
                break;
            }

            report.attempted += 1;
            match self.executor.execute(&entry.operation).await {
                Ok(()) => {
                    entry.mark_synced();
                    report.synced += 1;
                    debug!(
                        target: "offline::sync",
                        id = %entry.id,
                        operation_type = entry.operation_type(),
                        "operation synced"
                    );
                }
                Err(err) => {
                    let status =
                        entry.record_failure(self.clock.now(), &err, self.policy.max_retries);
                    if status == SyncStatus::Failed {
                        report.failed += 1;
                        warn!(
                            target: "offline::sync",
                            id = %entry.id,
                            operation_type = entry.operation_type(),
                            retry_count = entry.retry_count,
                            error = %err,
                            "operation failed permanently"
                        );
                    } else {
                        report.retried += 1;
                        debug!(
                            target: "offline::sync",
                            id = %entry.id,
                            operation_type = entry.operation_type(),
                            retry_count = entry.retry_count,
                            next_backoff_ms = self.policy.backoff(entry.retry_count).as_millis() as u64,
                            error = %err,
                            "operation failed; will retry"
                        );
                    }
                }
            }
            outcomes.push(entry);
        }

        self.queue.apply_outcomes(outcomes).await;

        report.remaining = u32::try_from(self.queue.pending().await.len()).unwrap_or(u32::MAX);
        report.duration_ms = started.elapsed().as_millis() as u64;

        if report.synced > 0 {
            self.notifier.notify(SyncNotice::Synced {
                count: report.synced,
            });
        }
        if report.failed > 0 {
            self.notifier.notify(SyncNotice::Failed {
                count: report.failed,
            });
        }

        let outcome = self.metrics.record_pass(&report);
        if report.attempted > 0 {
            info!(
                target: "offline::sync",
                trigger = trigger.as_str(),
                attempted = report.attempted,
                synced = report.synced,
                retried = report.retried,
                failed = report.failed,
                deferred = report.deferred,
                remaining = report.remaining,
                duration_ms = report.duration_ms,
                outcome = ?outcome,
                "flush pass completed"
            );
        }

        FlushOutcome::Completed(report)
    }

    /// Operator action: resets every failed entry and flushes right away.
    pub async fn retry_failed(&self) -> FlushOutcome {
        let reset = self.queue.reset_failed().await;
        info!(target: "offline::sync", reset, "failed operations reset for retry");
        self.flush(FlushTrigger::RetryFailed).await
    }
}
