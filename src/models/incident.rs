use crate::error::AppError;
use crate::filter::Tagged;
use crate::layout::Keyed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

/// An incident as returned by the incident service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Server-assigned identifier
    pub id: String,

    /// Human-readable title
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// Severity level (1 = most severe)
    pub severity: Severity,

    /// Current status
    pub status: IncidentStatus,

    /// Owning person or team
    #[validate(length(min = 1, max = 255))]
    pub owner: String,

    /// Source system
    #[validate(length(min = 1, max = 255))]
    pub source: String,

    /// What triggered the incident
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Build the record a server creates for `dto`.
    ///
    /// Only the incident service assigns ids and timestamps; clients receive
    /// records through the gateway.
    pub fn materialize(id: String, dto: CreateIncidentDto, at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: dto.title,
            severity: dto.severity,
            status: dto.status,
            owner: dto.owner,
            source: dto.source,
            trigger: dto.trigger.filter(|t| !t.is_empty()),
            created_at: at,
            updated_at: at,
        }
    }

    /// Check if incident is still being worked on
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            IncidentStatus::Open | IncidentStatus::Investigating
        )
    }

    /// Check if incident is critical
    pub fn is_critical(&self) -> bool {
        self.severity.is_critical()
    }
}

impl Keyed for Incident {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Tagged for Incident {
    /// Lowercase severity label followed by the status word
    fn tags(&self) -> Vec<String> {
        vec![
            self.severity.label().to_lowercase(),
            self.status.to_string(),
        ]
    }
}

/// Incident severity, transmitted as an integer 1..=5
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, EnumIter,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Severity {
    Critical = 1,
    High = 2,
    #[default]
    Medium = 3,
    Low = 4,
    Info = 5,
}

impl Severity {
    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Info => "Info",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl TryFrom<u8> for Severity {
    type Error = AppError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Severity::Critical),
            2 => Ok(Severity::High),
            3 => Ok(Severity::Medium),
            4 => Ok(Severity::Low),
            5 => Ok(Severity::Info),
            other => Err(AppError::Validation(format!(
                "severity must be between 1 and 5, got {}",
                other
            ))),
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.level()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Accepts either the numeric level or the label, case-insensitively
impl FromStr for Severity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(level) = trimmed.parse::<u8>() {
            return Severity::try_from(level);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            _ => Err(AppError::Validation(format!("unknown severity '{}'", s))),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IncidentStatus {
    #[default]
    Open,
    Investigating,
    Resolved,
    Closed,
}

impl IncidentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "Open",
            IncidentStatus::Investigating => "Investigating",
            IncidentStatus::Resolved => "Resolved",
            IncidentStatus::Closed => "Closed",
        }
    }
}

/// Payload for creating an incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentDto {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub status: IncidentStatus,

    #[validate(length(min = 1, max = 255))]
    pub owner: String,

    #[validate(length(min = 1, max = 255))]
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl CreateIncidentDto {
    pub fn new(title: impl Into<String>, owner: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            severity: Severity::default(),
            status: IncidentStatus::default(),
            owner: owner.into(),
            source: source.into(),
            trigger: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }
}

/// Partial patch; absent fields are left unchanged by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncidentDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl UpdateIncidentDto {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.severity.is_none()
            && self.status.is_none()
            && self.owner.is_none()
            && self.source.is_none()
            && self.trigger.is_none()
    }

    /// Apply the present fields to `incident` and bump its update time
    pub fn apply_to(&self, incident: &mut Incident, at: DateTime<Utc>) {
        if let Some(ref title) = self.title {
            incident.title = title.clone();
        }
        if let Some(severity) = self.severity {
            incident.severity = severity;
        }
        if let Some(status) = self.status {
            incident.status = status;
        }
        if let Some(ref owner) = self.owner {
            incident.owner = owner.clone();
        }
        if let Some(ref source) = self.source {
            incident.source = source.clone();
        }
        if let Some(ref trigger) = self.trigger {
            incident.trigger = if trigger.is_empty() {
                None
            } else {
                Some(trigger.clone())
            };
        }
        incident.updated_at = at.max(incident.created_at);
    }
}

/// The edit dialog submits its whole form as a patch
impl From<CreateIncidentDto> for UpdateIncidentDto {
    fn from(dto: CreateIncidentDto) -> Self {
        Self {
            title: Some(dto.title),
            severity: Some(dto.severity),
            status: Some(dto.status),
            owner: Some(dto.owner),
            source: Some(dto.source),
            trigger: Some(dto.trigger.unwrap_or_default()),
        }
    }
}

/// Body of `PATCH /incidents/{id}/status`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusPatch {
    pub status: IncidentStatus,
}

/// Body of `PATCH /incidents/{id}/severity`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityPatch {
    pub severity: Severity,
}
