use crate::error::{AppError, Operation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// A mutation whose outcome has not been reported yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotification {
    /// Unique per store; doubles as the mutation ticket
    pub id: u64,
    pub operation: Operation,
    /// Target incident, absent for creates
    pub incident_id: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl PendingNotification {
    pub fn new(id: u64, operation: Operation, incident_id: Option<String>) -> Self {
        Self {
            id,
            operation,
            incident_id,
            started_at: Utc::now(),
        }
    }

    pub fn message(&self) -> &'static str {
        self.operation.pending_message()
    }
}

/// Observer of mutation lifecycles.
///
/// For every mutation `started` is called first, followed by exactly one of
/// `succeeded` or `failed` for the same [`PendingNotification::id`].
pub trait NotificationSink: Send + Sync {
    fn started(&self, pending: &PendingNotification);

    fn succeeded(&self, pending: &PendingNotification);

    fn failed(&self, pending: &PendingNotification, error: &AppError);
}

/// Sink that writes lifecycle events as log lines
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn started(&self, pending: &PendingNotification) {
        info!(
            notification_id = pending.id,
            operation = %pending.operation,
            incident_id = ?pending.incident_id,
            "{}",
            pending.message()
        );
    }

    fn succeeded(&self, pending: &PendingNotification) {
        info!(
            notification_id = pending.id,
            operation = %pending.operation,
            incident_id = ?pending.incident_id,
            "{}",
            pending.operation.success_message()
        );
    }

    fn failed(&self, pending: &PendingNotification, error: &AppError) {
        error!(
            notification_id = pending.id,
            operation = %pending.operation,
            incident_id = ?pending.incident_id,
            error = %error,
            "{}",
            pending.operation.failure_message()
        );
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn started(&self, _pending: &PendingNotification) {}

    fn succeeded(&self, _pending: &PendingNotification) {}

    fn failed(&self, _pending: &PendingNotification, _error: &AppError) {}
}

/// One mutation's lifecycle.
///
/// Reports `started` on creation and exactly one outcome: `succeed` and `fail`
/// consume the guard, and a guard dropped before either (the task settling
/// the mutation panicked or was aborted) reports a failure.
pub struct Lifecycle {
    sink: Arc<dyn NotificationSink>,
    pending: PendingNotification,
    resolved: bool,
}

impl Lifecycle {
    pub fn begin(sink: Arc<dyn NotificationSink>, pending: PendingNotification) -> Self {
        sink.started(&pending);
        Self {
            sink,
            pending,
            resolved: false,
        }
    }

    pub fn pending(&self) -> &PendingNotification {
        &self.pending
    }

    pub fn succeed(mut self) {
        self.resolved = true;
        self.sink.succeeded(&self.pending);
    }

    pub fn fail(mut self, error: &AppError) {
        self.resolved = true;
        self.sink.failed(&self.pending, error);
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if !self.resolved {
            let error = AppError::Internal("operation abandoned before it settled".to_string());
            self.sink.failed(&self.pending, &error);
        }
    }
}
