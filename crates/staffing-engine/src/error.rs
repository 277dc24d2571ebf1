//! Error types for the staffing engine
//!
//! Only genuine input and programming errors are represented here. Conditions
//! the engine is expected to run into during normal operation (an interval
//! that cannot meet its target, demand that the roster cannot cover, a live
//! feed that is temporarily down, a skipped monitoring tick) are modelled as
//! data on the respective result types instead.

use thiserror::Error;

use crate::types::ScopeId;

/// Result type for staffing engine operations
pub type Result<T> = std::result::Result<T, StaffingError>;

/// Errors that can occur in the staffing engine
#[derive(Debug, Error)]
pub enum StaffingError {
    /// Malformed forecast, roster or constraint data. Aborts the single
    /// operation without partial output.
    #[error("Input validation failed: {message}")]
    InputValidation { message: String },

    /// A collaborator fetch failed
    #[error("Data unavailable from {source_name} for scope {scope_id}: {message}")]
    DataUnavailable {
        source_name: String,
        scope_id: String,
        message: String,
    },

    /// The scope is already being monitored
    #[error("Scope {scope_id} is already being monitored")]
    AlreadyMonitoring { scope_id: ScopeId },

    /// No monitor is registered for the scope
    #[error("No monitor registered for scope {scope_id}")]
    ScopeNotFound { scope_id: ScopeId },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StaffingError {
    /// Create an input validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::InputValidation {
            message: message.into(),
        }
    }

    /// Create a data unavailable error
    pub fn data_unavailable(
        source_name: impl Into<String>,
        scope_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DataUnavailable {
            source_name: source_name.into(),
            scope_id: scope_id.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error is a transient collaborator failure worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

impl From<toml::de::Error> for StaffingError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Invalid TOML: {}", err))
    }
}

impl From<std::io::Error> for StaffingError {
    fn from(err: std::io::Error) -> Self {
        Self::config(format!("I/O error: {}", err))
    }
}
