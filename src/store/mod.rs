//! Local incident cache synchronized with the incident service.
//!
//! The store is the single owner of the incident collection. Every change to
//! it follows a settled remote call: success applies the server's record,
//! failure leaves the collection untouched. Readers only ever get clones.
//!
//! Remote calls run on their own tokio task together with the step that
//! applies their response, so a caller that stops waiting does not cancel
//! them: the response still lands in the cache and is still reported.

use crate::config::{ResponseOrdering, StoreConfig};
use crate::error::{AppError, Operation, Result};
use crate::gateway::RemoteIncidentGateway;
use crate::models::{CreateIncidentDto, Incident, IncidentStatus, Severity, UpdateIncidentDto};
use crate::notifications::{Lifecycle, NotificationSink, PendingNotification, TracingSink};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use validator::Validate;

/// Result of the bulk load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Persistent until the caller loads again; there is no automatic retry
    Failed { message: String },
}

impl LoadState {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed { .. })
    }
}

/// State shared between the store handle and its in-flight tasks
struct Cache {
    incidents: RwLock<Vec<Incident>>,
    load_state: RwLock<LoadState>,
    next_ticket: AtomicU64,
    /// Latest applied mutation ticket per incident id (`LastIssued` only)
    applied: Mutex<HashMap<String, u64>>,
    revision: watch::Sender<u64>,
}

/// Handle to the incident cache; clones share the same collection
#[derive(Clone)]
pub struct IncidentStore {
    gateway: Arc<dyn RemoteIncidentGateway>,
    sink: Arc<dyn NotificationSink>,
    ordering: ResponseOrdering,
    cache: Arc<Cache>,
}

impl IncidentStore {
    pub fn new(gateway: Arc<dyn RemoteIncidentGateway>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            gateway,
            sink: Arc::new(TracingSink),
            ordering: ResponseOrdering::default(),
            cache: Arc::new(Cache {
                incidents: RwLock::new(Vec::new()),
                load_state: RwLock::new(LoadState::Idle),
                next_ticket: AtomicU64::new(1),
                applied: Mutex::new(HashMap::new()),
                revision,
            }),
        }
    }

    pub fn from_config(gateway: Arc<dyn RemoteIncidentGateway>, config: &StoreConfig) -> Self {
        Self::new(gateway).with_ordering(config.response_ordering)
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    // ---- projections -------------------------------------------------------

    /// Clone of the collection in display order
    pub fn snapshot(&self) -> Vec<Incident> {
        self.cache.incidents.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<Incident> {
        self.cache
            .incidents
            .read()
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.incidents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.incidents.read().is_empty()
    }

    pub fn load_state(&self) -> LoadState {
        self.cache.load_state.read().clone()
    }

    /// Receiver that observes a new revision after every collection change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cache.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.cache.revision.borrow()
    }

    // ---- reads -------------------------------------------------------------

    /// Replace the whole collection with the server's list, in server order.
    ///
    /// On failure the collection is emptied and the load state is `Failed`.
    pub async fn load_all(&self) -> Result<()> {
        *self.cache.load_state.write() = LoadState::Loading;

        let store = self.clone();
        detached(async move {
            match store.gateway.list().await {
                Ok(incidents) => {
                    let count = incidents.len();
                    *store.cache.incidents.write() = incidents;
                    *store.cache.load_state.write() = LoadState::Loaded;
                    store.cache.applied.lock().clear();
                    store.bump();
                    info!(count, "Incidents loaded");
                    Ok(())
                }
                Err(e) => {
                    let err = e.at_boundary(Operation::LoadAll);
                    store.cache.incidents.write().clear();
                    *store.cache.load_state.write() = LoadState::Failed {
                        message: Operation::LoadAll.failure_message().to_string(),
                    };
                    store.bump();
                    error!(error = %err, "Failed to fetch incidents");
                    Err(err)
                }
            }
        })
        .await
    }

    /// Refresh one record in place from the server
    pub async fn reload(&self, id: &str) -> Result<Incident> {
        let store = self.clone();
        let id = id.to_string();
        detached(async move {
            match store.gateway.get(&id).await {
                Ok(incident) => {
                    store.replace(&id, &incident);
                    Ok(incident)
                }
                Err(e) => Err(e.at_boundary(Operation::Get)),
            }
        })
        .await
    }

    // ---- mutations ---------------------------------------------------------

    /// Create an incident; the server's record is prepended
    pub async fn create(&self, dto: CreateIncidentDto) -> Result<Incident> {
        let lifecycle = self.begin(Operation::Create, None);

        let store = self.clone();
        detached(async move {
            match validated(&dto, store.gateway.create(&dto)).await {
                Ok(incident) => {
                    store.cache.incidents.write().insert(0, incident.clone());
                    store.bump();
                    debug!(incident_id = %incident.id, "Incident prepended");
                    lifecycle.succeed();
                    Ok(incident)
                }
                Err(e) => Err(store.fail(lifecycle, e)),
            }
        })
        .await
    }

    /// Patch an incident; the server's full record replaces the cached one in place
    pub async fn update(&self, id: &str, dto: UpdateIncidentDto) -> Result<Incident> {
        let gateway = self.gateway.clone();
        let target = id.to_string();
        self.replace_with(Operation::Update, id, async move {
            validated(&dto, gateway.update(&target, &dto)).await
        })
        .await
    }

    pub async fn update_status(&self, id: &str, status: IncidentStatus) -> Result<Incident> {
        let gateway = self.gateway.clone();
        let target = id.to_string();
        self.replace_with(Operation::UpdateStatus, id, async move {
            gateway.update_status(&target, status).await
        })
        .await
    }

    pub async fn update_severity(&self, id: &str, severity: Severity) -> Result<Incident> {
        let gateway = self.gateway.clone();
        let target = id.to_string();
        self.replace_with(Operation::UpdateSeverity, id, async move {
            gateway.update_severity(&target, severity).await
        })
        .await
    }

    /// Delete an incident; exactly the matching record is removed
    pub async fn delete(&self, id: &str) -> Result<()> {
        let lifecycle = self.begin(Operation::Delete, Some(id));

        let store = self.clone();
        let id = id.to_string();
        detached(async move {
            match store.gateway.delete(&id).await {
                Ok(()) => {
                    store.forget(&id);
                    let removed = {
                        let mut incidents = store.cache.incidents.write();
                        let before = incidents.len();
                        incidents.retain(|i| i.id != id);
                        before - incidents.len()
                    };
                    if removed > 0 {
                        store.bump();
                    }
                    debug!(incident_id = %id, removed, "Incident removed");
                    lifecycle.succeed();
                    Ok(())
                }
                Err(e) => Err(store.fail(lifecycle, e)),
            }
        })
        .await
    }

    // ---- internals ---------------------------------------------------------

    /// Reports `started` and takes the next ticket, before any remote call
    fn begin(&self, operation: Operation, incident_id: Option<&str>) -> Lifecycle {
        let ticket = self.cache.next_ticket.fetch_add(1, Ordering::SeqCst);
        Lifecycle::begin(
            self.sink.clone(),
            PendingNotification::new(ticket, operation, incident_id.map(str::to_string)),
        )
    }

    fn fail(&self, lifecycle: Lifecycle, error: AppError) -> AppError {
        let pending = lifecycle.pending();
        let error = error.at_boundary(pending.operation);
        warn!(
            operation = %pending.operation,
            incident_id = ?pending.incident_id,
            error = %error,
            "Mutation failed; cache left unchanged"
        );
        lifecycle.fail(&error);
        error
    }

    async fn replace_with<F>(&self, operation: Operation, id: &str, call: F) -> Result<Incident>
    where
        F: Future<Output = Result<Incident>> + Send + 'static,
    {
        let lifecycle = self.begin(operation, Some(id));
        let ticket = lifecycle.pending().id;

        let store = self.clone();
        let id = id.to_string();
        detached(async move {
            match call.await {
                Ok(incident) => {
                    if store.admit(&id, ticket) {
                        store.replace(&id, &incident);
                    }
                    lifecycle.succeed();
                    Ok(incident)
                }
                Err(e) => Err(store.fail(lifecycle, e)),
            }
        })
        .await
    }

    /// Whether a successful response for `ticket` may be applied to `id`
    fn admit(&self, id: &str, ticket: u64) -> bool {
        if self.ordering == ResponseOrdering::LastSettled {
            return true;
        }

        let mut applied = self.cache.applied.lock();
        match applied.get(id) {
            Some(&latest) if latest > ticket => {
                warn!(
                    incident_id = %id,
                    ticket,
                    latest,
                    "Discarding stale response"
                );
                false
            }
            _ => {
                applied.insert(id.to_string(), ticket);
                true
            }
        }
    }

    /// Drop ordering state for an id that no longer exists
    fn forget(&self, id: &str) {
        self.cache.applied.lock().remove(id);
    }

    fn replace(&self, id: &str, incident: &Incident) {
        let replaced = {
            let mut incidents = self.cache.incidents.write();
            match incidents.iter_mut().find(|i| i.id == id) {
                Some(slot) => {
                    *slot = incident.clone();
                    true
                }
                None => false,
            }
        };

        if replaced {
            self.bump();
        } else {
            debug!(incident_id = %id, "Response for an incident no longer cached");
        }
    }

    fn bump(&self) {
        self.cache.revision.send_modify(|revision| *revision += 1);
    }
}

/// Run `task` to completion on its own tokio task and wait for it.
///
/// Dropping the returned future does not abort the task.
async fn detached<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(task)
        .await
        .map_err(|e| AppError::Internal(format!("Store task did not complete: {}", e)))?
}

/// Run `call` only if `payload` passes validation
async fn validated<T, V, F>(payload: &V, call: F) -> Result<T>
where
    V: Validate,
    F: Future<Output = Result<T>>,
{
    payload.validate()?;
    call.await
}
