//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain_policy::DashboardError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// The data platform or database failed the read
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal_error",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Validation(_) => "validation_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg)
            | ApiError::Upstream(msg)
            | ApiError::Validation(msg) => msg.clone(),
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::QueryFailed(port) if port.is_not_found() => ApiError::NotFound(port.to_string()),
            DashboardError::QueryFailed(port) => ApiError::Upstream(port.to_string()),
            DashboardError::InvalidPageRequest(msg) => ApiError::Validation(msg),
            err @ DashboardError::InvalidFilter { .. } => ApiError::BadRequest(err.to_string()),
            err @ DashboardError::UnknownField(_) => ApiError::BadRequest(err.to_string()),
            err @ DashboardError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DashboardError::Unauthenticated => ApiError::Unauthorized("Not authenticated".to_string()),
            DashboardError::Forbidden(msg) => ApiError::Forbidden(msg),
            err @ DashboardError::SignOutFailed(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PortError;

    #[test]
    fn test_gateway_failure_is_bad_gateway() {
        let err = ApiError::from(DashboardError::QueryFailed(PortError::connection("refused")));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_missing_policy_is_not_found() {
        let err = ApiError::from(DashboardError::not_found("Policy", "pol-1"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not found: Policy not found: pol-1");
    }

    #[test]
    fn test_filter_errors_are_bad_requests() {
        let err = ApiError::from(DashboardError::invalid_filter("start_date", "expected YYYY-MM-DD"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(DashboardError::UnknownField("colour".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(ApiError::from(AuthError::TokenRevoked).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthError::Signing("bad key".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
