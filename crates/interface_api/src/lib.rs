//! HTTP API Layer
//!
//! This crate serves the policy dashboard over HTTP using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: policy list and lookup, per-user dashboard, session
//! - **Middleware**: JWT authentication, audit logging, tracing
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: `{error, message}` bodies with mapped status codes
//!
//! The router is generic over the data source: it holds an
//! `Arc<dyn DataGateway>`, which the server binary builds from configuration
//! (hosted REST platform or direct PostgreSQL) and tests replace with the
//! in-memory gateway.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(gateway, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod sessions;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_policy::DataGateway;

use crate::auth::TokenRevocations;
use crate::config::ApiConfig;
use crate::handlers::{dashboard, health, policy, session};
use crate::middleware::{audit_middleware, auth_middleware};
use crate::sessions::DashboardSessions;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn DataGateway>,
    pub config: Arc<ApiConfig>,
    pub sessions: DashboardSessions,
    pub revocations: TokenRevocations,
}

impl AppState {
    pub fn new(gateway: Arc<dyn DataGateway>, config: ApiConfig) -> Self {
        Self {
            sessions: DashboardSessions::with_idle_timeout(Arc::clone(&gateway), config.session_idle_timeout()),
            gateway,
            config: Arc::new(config),
            revocations: TokenRevocations::new(),
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `gateway` - Data source for every query
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(gateway: Arc<dyn DataGateway>, config: ApiConfig) -> Router {
    router_with_state(AppState::new(gateway, config))
}

/// Creates the router over an existing state, e.g. one a test keeps a handle to
pub fn router_with_state(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let policy_routes = Router::new()
        .route("/", get(policy::list_policies))
        .route("/:id", get(policy::get_policy));

    let dashboard_routes = Router::new()
        .route("/", get(dashboard::get_dashboard))
        .route(
            "/filters",
            put(dashboard::set_filter).delete(dashboard::reset_filters),
        )
        .route("/options", get(dashboard::get_options));

    let session_routes = Router::new()
        .route("/", get(session::get_session))
        .route("/sign-out", post(session::sign_out));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/policies", policy_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/session", session_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
