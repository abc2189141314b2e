use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Remote operations the dashboard can attempt against the incident service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    LoadAll,
    Get,
    Create,
    Update,
    UpdateStatus,
    UpdateSeverity,
    Delete,
}

impl Operation {
    /// Whether the operation writes to the remote service
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::LoadAll | Operation::Get)
    }

    /// Message shown while the operation is in flight
    pub fn pending_message(&self) -> &'static str {
        match self {
            Operation::LoadAll => "Loading incidents...",
            Operation::Get => "Loading incident...",
            Operation::Create => "Creating incident...",
            Operation::Update => "Updating incident...",
            Operation::UpdateStatus => "Updating status...",
            Operation::UpdateSeverity => "Updating severity...",
            Operation::Delete => "Deleting incident...",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Operation::LoadAll => "Incidents loaded",
            Operation::Get => "Incident loaded",
            Operation::Create => "Incident created successfully",
            Operation::Update => "Incident updated successfully",
            Operation::UpdateStatus => "Status updated successfully",
            Operation::UpdateSeverity => "Severity updated successfully",
            Operation::Delete => "Incident deleted successfully",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::LoadAll => "Failed to fetch incidents",
            Operation::Get => "Failed to fetch incident",
            Operation::Create => "Failed to create incident",
            Operation::Update => "Failed to update incident",
            Operation::UpdateStatus => "Failed to update status",
            Operation::UpdateSeverity => "Failed to update severity",
            Operation::Delete => "Failed to delete incident",
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// A read from the incident service failed
    #[error("Fetch error ({operation}): {message}")]
    Fetch { operation: Operation, message: String },

    /// A write to the incident service failed
    #[error("Mutation error ({operation}): {message}")]
    Mutation { operation: Operation, message: String },

    /// Transport errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Non-success response from the incident service
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Fetch { .. } => "FETCH_ERROR",
            AppError::Mutation { .. } => "MUTATION_ERROR",
            AppError::Network(_) => "NETWORK_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Http { .. } => "HTTP_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The operation a store-boundary error was raised for
    pub fn operation(&self) -> Option<Operation> {
        match self {
            AppError::Fetch { operation, .. } | AppError::Mutation { operation, .. } => {
                Some(*operation)
            }
            _ => None,
        }
    }

    /// Convert a lower-level error into the store-boundary kind for `operation`.
    ///
    /// Reads become [`AppError::Fetch`], writes become [`AppError::Mutation`].
    /// Errors that already carry an operation are passed through.
    pub fn at_boundary(self, operation: Operation) -> Self {
        match self {
            AppError::Fetch { .. } | AppError::Mutation { .. } => self,
            other => {
                let message = other.to_string();
                if operation.is_mutation() {
                    AppError::Mutation { operation, message }
                } else {
                    AppError::Fetch { operation, message }
                }
            }
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Conversion from reqwest::Error
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::Serialization(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
