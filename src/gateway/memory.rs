use super::RemoteIncidentGateway;
use crate::error::{AppError, Operation, Result};
use crate::models::{CreateIncidentDto, Incident, IncidentStatus, Severity, UpdateIncidentDto};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Process-local stand-in for the incident service (demos and testing).
///
/// Lists newest first, assigns UUIDv7 ids and timestamps, and can be told to
/// fail individual operations or to go offline entirely.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    /// id -> (insertion sequence, record)
    incidents: Arc<DashMap<String, (u64, Incident)>>,
    sequence: Arc<AtomicU64>,
    offline: Arc<AtomicBool>,
    failing: Arc<Mutex<HashSet<Operation>>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records; the first record lists first
    pub fn with_incidents(incidents: Vec<Incident>) -> Self {
        let gateway = Self::new();
        for incident in incidents.into_iter().rev() {
            let seq = gateway.sequence.fetch_add(1, Ordering::SeqCst);
            gateway
                .incidents
                .insert(incident.id.clone(), (seq, incident));
        }
        gateway
    }

    /// Make every call fail with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make calls for `operation` fail until [`recover`](Self::recover)
    pub fn fail(&self, operation: Operation) {
        self.failing.lock().insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.failing.lock().remove(&operation);
    }

    /// Number of calls received, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Server-side view of a record
    pub fn record(&self, id: &str) -> Option<Incident> {
        self.incidents.get(id).map(|entry| entry.value().1.clone())
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    fn enter(&self, operation: Operation) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Network("incident service unreachable".to_string()));
        }
        if self.failing.lock().contains(&operation) {
            return Err(AppError::Http {
                status: 500,
                body: format!("{} failed", operation),
            });
        }
        Ok(())
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut Incident)) -> Result<Incident> {
        let mut entry = self
            .incidents
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;
        f(&mut entry.value_mut().1);
        Ok(entry.value().1.clone())
    }
}

#[async_trait]
impl RemoteIncidentGateway for InMemoryGateway {
    async fn list(&self) -> Result<Vec<Incident>> {
        self.enter(Operation::LoadAll)?;
        let mut records: Vec<(u64, Incident)> = self
            .incidents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first
        records.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(records.into_iter().map(|(_, incident)| incident).collect())
    }

    async fn get(&self, id: &str) -> Result<Incident> {
        self.enter(Operation::Get)?;
        self.record(id)
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))
    }

    async fn create(&self, dto: &CreateIncidentDto) -> Result<Incident> {
        self.enter(Operation::Create)?;
        dto.validate()?;

        let incident = Incident::materialize(Uuid::now_v7().to_string(), dto.clone(), Utc::now());
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.incidents
            .insert(incident.id.clone(), (seq, incident.clone()));

        tracing::debug!(incident_id = %incident.id, "Incident created");
        Ok(incident)
    }

    async fn update(&self, id: &str, dto: &UpdateIncidentDto) -> Result<Incident> {
        self.enter(Operation::Update)?;
        dto.validate()?;
        self.modify(id, |incident| dto.apply_to(incident, Utc::now()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.enter(Operation::Delete)?;
        self.incidents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))
    }

    async fn update_status(&self, id: &str, status: IncidentStatus) -> Result<Incident> {
        self.enter(Operation::UpdateStatus)?;
        self.modify(id, |incident| {
            incident.status = status;
            incident.updated_at = Utc::now().max(incident.created_at);
        })
    }

    async fn update_severity(&self, id: &str, severity: Severity) -> Result<Incident> {
        self.enter(Operation::UpdateSeverity)?;
        self.modify(id, |incident| {
            incident.severity = severity;
            incident.updated_at = Utc::now().max(incident.created_at);
        })
    }
}
