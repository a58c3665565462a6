#![allow(dead_code)]

use async_trait::async_trait;
use opsdesk_offline::{ExecutionError, OfflineOperation, OperationExecutor, SyncNotice, SyncNotifier};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operationType", content = "payload", rename_all = "snake_case")]
pub enum DashboardOperation {
    UpdateUser { id: String, name: String },
    CloseWorkOrder { id: String, note: Option<String> },
    AcknowledgeAlert { id: String },
}

impl OfflineOperation for DashboardOperation {
    fn operation_type(&self) -> &str {
        match self {
            DashboardOperation::UpdateUser { .. } => "update_user",
            DashboardOperation::CloseWorkOrder { .. } => "close_work_order",
            DashboardOperation::AcknowledgeAlert { .. } => "acknowledge_alert",
        }
    }
}

pub fn update_user(id: &str, name: &str) -> DashboardOperation {
    DashboardOperation::UpdateUser {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// Records every dispatched operation; replies from a script, then `Ok`.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<DashboardOperation>>,
    script: Mutex<VecDeque<Result<(), ExecutionError>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: Vec<Result<(), ExecutionError>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(script.into()),
        }
    }

    pub fn calls(&self) -> Vec<DashboardOperation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperationExecutor<DashboardOperation> for RecordingExecutor {
    async fn execute(&self, operation: &DashboardOperation) -> Result<(), ExecutionError> {
        self.calls.lock().unwrap().push(operation.clone());
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<SyncNotice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<SyncNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl SyncNotifier for RecordingNotifier {
    fn notify(&self, notice: SyncNotice) {
        self.notices.lock().unwrap().push(notice);
    }
}
