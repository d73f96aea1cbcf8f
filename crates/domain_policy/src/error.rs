//! Dashboard domain errors
//!
//! This module defines all error types that can occur while querying,
//! filtering, and aggregating policy data.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the policy dashboard domain
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The gateway reported a failure for a read
    #[error("Query failed: {0}")]
    QueryFailed(#[from] PortError),

    /// Page number or page size out of range
    #[error("Invalid page request: {0}")]
    InvalidPageRequest(String),

    /// A filter value could not be interpreted for its field
    #[error("Invalid value for filter '{key}': {message}")]
    InvalidFilter {
        key: String,
        message: String,
    },

    /// Column or filter name that does not exist on the record
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// No signed-in user
    #[error("Not authenticated")]
    Unauthenticated,

    /// Signed in, but none of the required roles
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The auth collaborator refused or failed the sign-out
    #[error("Sign-out failed: {0}")]
    SignOutFailed(PortError),
}

impl DashboardError {
    /// Creates an invalid filter error
    pub fn invalid_filter(key: impl Into<String>, message: impl Into<String>) -> Self {
        DashboardError::InvalidFilter {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a not found error
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        DashboardError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// True when the failure came from the gateway rather than from the caller's input
    pub fn is_query_failure(&self) -> bool {
        matches!(self, DashboardError::QueryFailed(_))
    }
}

/// Result alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;
