//! Database error types
//!
//! Errors raised by the PostgreSQL gateway and their translation into the
//! port-level `PortError` the domain sees.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// The statement referenced a table or column that does not exist
    #[error("Undefined object: {0}")]
    UndefinedObject(String),

    /// The role lacks privileges on the table
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The statement was cancelled by `statement_timeout`
    #[error("Statement timed out: {0}")]
    StatementTimeout(String),

    /// A row column could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// Database errors are classified by their PostgreSQL SQLSTATE code.
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                DatabaseError::SerializationError(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("42P01") | Some("42703") => DatabaseError::UndefinedObject(message),
                    Some("42501") => DatabaseError::PermissionDenied(message),
                    Some("57014") => DatabaseError::StatementTimeout(message),
                    Some(code) if code.starts_with("08") => DatabaseError::ConnectionFailed(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::ServiceUnavailable {
                service: "postgres pool".to_string(),
            },
            DatabaseError::NotFound(message) => PortError::not_found("record", message),
            DatabaseError::UndefinedObject(message) => PortError::validation(message),
            DatabaseError::PermissionDenied(message) => PortError::unauthorized(message),
            DatabaseError::StatementTimeout(message) => PortError::Timeout {
                operation: message,
                duration_ms: 0,
            },
            DatabaseError::SerializationError(message) => PortError::transformation(message),
            DatabaseError::QueryFailed(message) => PortError::internal(message),
        }
    }
}
