//! Lifecycle fan-out over a tokio broadcast channel
//!
//! Lets any number of UI surfaces (banner, tray, log tail) follow mutation
//! lifecycles without the store knowing about them.

use super::sink::{NotificationSink, PendingNotification};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum LifecyclePhase {
    Started,
    Succeeded,
    Failed { code: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub pending: PendingNotification,
    #[serde(flatten)]
    pub phase: LifecyclePhase,
    /// Text a toast or banner would show for this phase
    pub text: String,
}

impl LifecycleEvent {
    pub fn is_outcome(&self) -> bool {
        !matches!(self.phase, LifecyclePhase::Started)
    }
}

/// Sink that publishes every lifecycle event to subscribers
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: LifecycleEvent) {
        // No subscribers is not an error
        if self.tx.send(event).is_err() {
            debug!("Lifecycle event dropped: no subscribers");
        }
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for BroadcastSink {
    fn started(&self, pending: &PendingNotification) {
        self.publish(LifecycleEvent {
            pending: pending.clone(),
            phase: LifecyclePhase::Started,
            text: pending.message().to_string(),
        });
    }

    fn succeeded(&self, pending: &PendingNotification) {
        self.publish(LifecycleEvent {
            pending: pending.clone(),
            phase: LifecyclePhase::Succeeded,
            text: pending.operation.success_message().to_string(),
        });
    }

    fn failed(&self, pending: &PendingNotification, error: &AppError) {
        self.publish(LifecycleEvent {
            pending: pending.clone(),
            phase: LifecyclePhase::Failed {
                code: error.error_code().to_string(),
                message: error.to_string(),
            },
            text: pending.operation.failure_message().to_string(),
        });
    }
}
