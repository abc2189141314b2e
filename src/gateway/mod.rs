//! Remote incident service contract.
//!
//! | Operation    | Method + path                     |
//! |--------------|-----------------------------------|
//! | list         | `GET /incidents`                  |
//! | get one      | `GET /incidents/{id}`             |
//! | create       | `POST /incidents`                 |
//! | update       | `PATCH /incidents/{id}`           |
//! | delete       | `DELETE /incidents/{id}`          |
//! | set status   | `PATCH /incidents/{id}/status`    |
//! | set severity | `PATCH /incidents/{id}/severity`  |
//!
//! Implementations report any non-success response or transport failure as
//! an error; the store converts those into fetch/mutation errors.

pub mod http;
pub mod memory;

pub use http::HttpIncidentGateway;
pub use memory::InMemoryGateway;

use crate::error::Result;
use crate::models::{CreateIncidentDto, Incident, IncidentStatus, Severity, UpdateIncidentDto};
use async_trait::async_trait;

/// Remote CRUD operations on incidents
#[async_trait]
pub trait RemoteIncidentGateway: Send + Sync {
    /// List all incidents, in server order
    async fn list(&self) -> Result<Vec<Incident>>;

    /// Get a single incident
    async fn get(&self, id: &str) -> Result<Incident>;

    /// Create an incident; the server assigns id and timestamps
    async fn create(&self, dto: &CreateIncidentDto) -> Result<Incident>;

    /// Patch an incident, returning the full updated record
    async fn update(&self, id: &str, dto: &UpdateIncidentDto) -> Result<Incident>;

    /// Delete an incident
    async fn delete(&self, id: &str) -> Result<()>;

    /// Set only the status
    async fn update_status(&self, id: &str, status: IncidentStatus) -> Result<Incident>;

    /// Set only the severity
    async fn update_severity(&self, id: &str, severity: Severity) -> Result<Incident>;
}
