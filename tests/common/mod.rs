//! Shared fixtures for the incident store and dashboard tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use incident_stack::error::{AppError, Result};
use incident_stack::gateway::{InMemoryGateway, RemoteIncidentGateway};
use incident_stack::models::{
    CreateIncidentDto, Incident, IncidentStatus, Severity, UpdateIncidentDto,
};
use incident_stack::notifications::{NotificationSink, PendingNotification};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Lifecycle event kinds as recorded by [`RecordingSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    Succeeded,
    Failed,
}

/// Sink that keeps every lifecycle event in order
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(u64, Phase, String)>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<(u64, Phase, String)> {
        self.events.lock().clone()
    }

    pub fn phases(&self) -> Vec<(u64, Phase)> {
        self.events
            .lock()
            .iter()
            .map(|(id, phase, _)| (*id, *phase))
            .collect()
    }

    /// Panics unless every notification started once and settled once, in that order
    pub fn assert_well_formed(&self) {
        let mut seen: HashMap<u64, Vec<Phase>> = HashMap::new();
        for (id, phase) in self.phases() {
            seen.entry(id).or_default().push(phase);
        }
        for (id, phases) in seen {
            assert_eq!(phases.len(), 2, "notification {} has {:?}", id, phases);
            assert_eq!(phases[0], Phase::Started, "notification {} has {:?}", id, phases);
            assert_ne!(phases[1], Phase::Started, "notification {} has {:?}", id, phases);
        }
    }
}

impl NotificationSink for RecordingSink {
    fn started(&self, pending: &PendingNotification) {
        self.events
            .lock()
            .push((pending.id, Phase::Started, pending.message().to_string()));
    }

    fn succeeded(&self, pending: &PendingNotification) {
        self.events.lock().push((
            pending.id,
            Phase::Succeeded,
            pending.operation.success_message().to_string(),
        ));
    }

    fn failed(&self, pending: &PendingNotification, _error: &AppError) {
        self.events.lock().push((
            pending.id,
            Phase::Failed,
            pending.operation.failure_message().to_string(),
        ));
    }
}

/// A server-side incident with fixed timestamps
pub fn incident(id: &str, title: &str, severity: Severity, status: IncidentStatus) -> Incident {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let mut incident = Incident::materialize(
        id.to_string(),
        CreateIncidentDto::new(title, "sre-team", "prometheus")
            .with_severity(severity)
            .with_status(status),
        created,
    );
    incident.updated_at = created + Duration::minutes(5);
    incident
}

/// The three incidents used by the tag filter scenarios
pub fn critical_scenario() -> Vec<Incident> {
    vec![
        incident("A", "Checkout errors", Severity::Critical, IncidentStatus::Open),
        incident("B", "Slow search", Severity::Low, IncidentStatus::Open),
        incident("C", "Payment outage", Severity::Critical, IncidentStatus::Resolved),
    ]
}

/// Gateway whose responses can be held back until released.
///
/// The wrapped gateway handles each call immediately; only the response is
/// delayed, so the server state reflects calls in issue order.
pub struct GatedGateway {
    pub inner: InMemoryGateway,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl GatedGateway {
    pub fn new(inner: InMemoryGateway) -> Self {
        Self {
            inner,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Hold the next response for `key` until the returned sender fires.
    ///
    /// Keys are the status word for status patches, the severity level for
    /// severity patches and the operation name otherwise.
    pub fn gate(&self, key: impl Into<String>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(key.into(), rx);
        tx
    }

    async fn hold(&self, key: &str) {
        let gate = self.gates.lock().remove(key);
        if let Some(rx) = gate {
            let _ = rx.await;
        }
    }
}

#[async_trait]
impl RemoteIncidentGateway for GatedGateway {
    async fn list(&self) -> Result<Vec<Incident>> {
        let result = self.inner.list().await;
        self.hold("load_all").await;
        result
    }

    async fn get(&self, id: &str) -> Result<Incident> {
        let result = self.inner.get(id).await;
        self.hold("get").await;
        result
    }

    async fn create(&self, dto: &CreateIncidentDto) -> Result<Incident> {
        let result = self.inner.create(dto).await;
        self.hold("create").await;
        result
    }

    async fn update(&self, id: &str, dto: &UpdateIncidentDto) -> Result<Incident> {
        let result = self.inner.update(id, dto).await;
        self.hold("update").await;
        result
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = self.inner.delete(id).await;
        self.hold("delete").await;
        result
    }

    async fn update_status(&self, id: &str, status: IncidentStatus) -> Result<Incident> {
        let result = self.inner.update_status(id, status).await;
        self.hold(&status.to_string()).await;
        result
    }

    async fn update_severity(&self, id: &str, severity: Severity) -> Result<Incident> {
        let result = self.inner.update_severity(id, severity).await;
        self.hold(&severity.to_string()).await;
        result
    }
}
