use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushTrigger {
    Timer,
    NetworkRestored,
    Manual,
    RetryFailed,
    Enqueue,
}

impl FlushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushTrigger::Timer => "timer",
            FlushTrigger::NetworkRestored => "network_restored",
            FlushTrigger::Manual => "manual",
            FlushTrigger::RetryFailed => "retry_failed",
            FlushTrigger::Enqueue => "enqueue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushReport {
    pub trigger: FlushTrigger,
    pub attempted: u32,
    pub synced: u32,
    /// Failed this pass but still pending.
    pub retried: u32,
    /// Became terminal this pass.
    pub failed: u32,
    /// Pending entries skipped because their backoff window is still open.
    pub deferred: u32,
    pub remaining: u32,
    pub duration_ms: u64,
}

impl FlushReport {
    pub fn new(trigger: FlushTrigger) -> Self {
        Self {
            trigger,
            attempted: 0,
            synced: 0,
            retried: 0,
            failed: 0,
            deferred: 0,
            remaining: 0,
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlushOutcome {
    /// The network monitor did not report `online`.
    Offline,
    /// Another pass was still in flight.
    AlreadyRunning,
    Completed(FlushReport),
}

impl FlushOutcome {
    pub fn report(&self) -> Option<&FlushReport> {
        match self {
            FlushOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn synced_count(&self) -> u32 {
        self.report().map(|report| report.synced).unwrap_or(0)
    }
}
