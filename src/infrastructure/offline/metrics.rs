use crate::domain::entities::{FlushReport, FlushTrigger};
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every attempted entry synced.
    Success,
    /// At least one attempted entry failed.
    Failure,
    /// Nothing was due.
    Idle,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_synced: u64,
    pub total_failed_attempts: u64,
    pub total_terminal_failures: u64,
    pub passes: u64,
    pub consecutive_failed_passes: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<PassOutcome>,
    pub last_trigger: Option<FlushTrigger>,
    pub last_attempted: Option<u32>,
    pub last_deferred: Option<u32>,
    pub last_remaining: Option<u32>,
    pub last_duration_ms: Option<u64>,
}

#[derive(Default, Clone)]
struct LastPass {
    outcome: Option<PassOutcome>,
    trigger: Option<FlushTrigger>,
    attempted: Option<u32>,
    deferred: Option<u32>,
    remaining: Option<u32>,
    duration_ms: Option<u64>,
}

/// Counters for one coordinator. Totals count entries, `passes` counts
/// completed flushes.
pub struct SyncMetrics {
    synced: AtomicU64,
    failed_attempts: AtomicU64,
    terminal_failures: AtomicU64,
    passes: AtomicU64,
    consecutive_failed_passes: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    last_pass: Mutex<LastPass>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            synced: AtomicU64::new(0),
            failed_attempts: AtomicU64::new(0),
            terminal_failures: AtomicU64::new(0),
            passes: AtomicU64::new(0),
            consecutive_failed_passes: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            last_pass: Mutex::new(LastPass::default()),
        }
    }

    pub fn record_pass(&self, report: &FlushReport) -> PassOutcome {
        let failures = report.retried + report.failed;
        let outcome = if report.attempted == 0 {
            PassOutcome::Idle
        } else if failures > 0 {
            PassOutcome::Failure
        } else {
            PassOutcome::Success
        };

        self.passes.fetch_add(1, Ordering::Relaxed);
        self.synced
            .fetch_add(u64::from(report.synced), Ordering::Relaxed);
        self.failed_attempts
            .fetch_add(u64::from(failures), Ordering::Relaxed);
        self.terminal_failures
            .fetch_add(u64::from(report.failed), Ordering::Relaxed);

        match outcome {
            PassOutcome::Success => {
                self.last_success_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failed_passes.store(0, Ordering::Relaxed);
            }
            PassOutcome::Failure => {
                self.last_failure_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failed_passes
                    .fetch_add(1, Ordering::Relaxed);
            }
            PassOutcome::Idle => {}
        }

        if let Ok(mut guard) = self.last_pass.lock() {
            guard.outcome = Some(outcome);
            guard.trigger = Some(report.trigger);
            guard.attempted = Some(report.attempted);
            guard.deferred = Some(report.deferred);
            guard.remaining = Some(report.remaining);
            guard.duration_ms = Some(report.duration_ms);
        }

        outcome
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let last = self
            .last_pass
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| LastPass::default());

        SyncMetricsSnapshot {
            total_synced: self.synced.load(Ordering::Relaxed),
            total_failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            total_terminal_failures: self.terminal_failures.load(Ordering::Relaxed),
            passes: self.passes.load(Ordering::Relaxed),
            consecutive_failed_passes: self.consecutive_failed_passes.load(Ordering::Relaxed),
            last_success_ms: to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: last.outcome,
            last_trigger: last.trigger,
            last_attempted: last.attempted,
            last_deferred: last.deferred,
            last_remaining: last.remaining,
            last_duration_ms: last.duration_ms,
        }
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 { None } else { Some(value) }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(trigger: FlushTrigger, attempted: u32, synced: u32, retried: u32, failed: u32) -> FlushReport {
        FlushReport {
            attempted,
            synced,
            retried,
            failed,
            ..FlushReport::new(trigger)
        }
    }

    #[test]
    fn record_success_and_failure() {
        let metrics = SyncMetrics::new();

        let outcome = metrics.record_pass(&report(FlushTrigger::Timer, 2, 2, 0, 0));
        assert_eq!(outcome, PassOutcome::Success);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_synced, 2);
        assert_eq!(snapshot.passes, 1);
        assert_eq!(snapshot.last_trigger, Some(FlushTrigger::Timer));
        assert!(snapshot.last_success_ms.is_some());
        assert!(snapshot.last_failure_ms.is_none());

        metrics.record_pass(&report(FlushTrigger::NetworkRestored, 3, 1, 1, 1));
        metrics.record_pass(&report(FlushTrigger::Timer, 1, 0, 0, 1));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_synced, 3);
        assert_eq!(snapshot.total_failed_attempts, 3);
        assert_eq!(snapshot.total_terminal_failures, 2);
        assert_eq!(snapshot.consecutive_failed_passes, 2);
        assert_eq!(snapshot.last_outcome, Some(PassOutcome::Failure));
    }

    #[test]
    fn idle_pass_keeps_failure_streak() {
        let metrics = SyncMetrics::new();
        metrics.record_pass(&report(FlushTrigger::Timer, 1, 0, 1, 0));
        assert_eq!(
            metrics.record_pass(&report(FlushTrigger::Timer, 0, 0, 0, 0)),
            PassOutcome::Idle
        );
        assert_eq!(metrics.snapshot().consecutive_failed_passes, 1);
    }
}
