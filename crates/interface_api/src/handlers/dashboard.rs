//! Dashboard handlers
//!
//! Every handler works on the caller's long-lived `DashboardSession`, so a
//! filter set by one request is still applied on the next.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use validator::Validate;

use domain_policy::{DashboardSession, FilterKey, FilterOptions, LoadOutcome};

use crate::auth::{roles, Claims};
use crate::dto::dashboard::{DashboardResponse, FilterUpdateRequest};
use crate::handlers::session::session_context;
use crate::{error::ApiError, AppState};

async fn dashboard_for(state: &AppState, claims: Claims) -> Result<Arc<DashboardSession>, ApiError> {
    let context = session_context(state, claims).await?;
    let user = context.authorize(roles::DASHBOARD_READERS).await?;
    Ok(state.sessions.get_or_start(&user.id).await?)
}

/// Resolves a load outcome to the view the caller should see
///
/// A superseded load answers with whatever newer view has been published.
fn respond(session: &DashboardSession, outcome: LoadOutcome) -> Result<Json<DashboardResponse>, ApiError> {
    let snapshot = match outcome {
        LoadOutcome::Applied(snapshot) => snapshot,
        LoadOutcome::Superseded { generation } => session.latest().ok_or_else(|| {
            ApiError::Conflict(format!("dashboard load {} was superseded by a newer one", generation))
        })?,
    };
    Ok(Json(DashboardResponse::from(snapshot.as_ref())))
}

/// The current dashboard view, loading it on first use
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let session = dashboard_for(&state, claims).await?;
    if let Some(snapshot) = session.latest() {
        return Ok(Json(DashboardResponse::from(snapshot.as_ref())));
    }
    let outcome = session.reload().await?;
    respond(&session, outcome)
}

/// Sets one filter and returns the reloaded view
pub async fn set_filter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<FilterUpdateRequest>,
) -> Result<Json<DashboardResponse>, ApiError> {
    request.validate()?;
    let key: FilterKey = request.key.parse()?;

    let session = dashboard_for(&state, claims).await?;
    let outcome = session.apply_filter(key, &request.value).await?;
    respond(&session, outcome)
}

/// Clears every filter and returns the reloaded view
pub async fn reset_filters(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let session = dashboard_for(&state, claims).await?;
    let outcome = session.reset_filters().await?;
    respond(&session, outcome)
}

/// The filter dropdown options
pub async fn get_options(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FilterOptions>, ApiError> {
    let session = dashboard_for(&state, claims).await?;
    Ok(Json(session.options()))
}
