//! Session handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use tracing::info;

use domain_policy::{DashboardResult, SessionContext};

use crate::auth::{Claims, TokenAuth};
use crate::dto::session::{SessionResponse, SignOutResponse};
use crate::{error::ApiError, AppState};

/// Builds and initialises the session context for one request's claims
pub(crate) async fn session_context(state: &AppState, claims: Claims) -> DashboardResult<SessionContext> {
    let auth = TokenAuth::new(claims, state.revocations.clone());
    let context = SessionContext::new(Arc::new(auth));
    context.init().await?;
    Ok(context)
}

/// Reports the caller's session state
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SessionResponse>, ApiError> {
    let context = session_context(&state, claims).await?;
    Ok(Json(SessionResponse {
        session: context.state().await,
        landing: context.landing().await.path(),
    }))
}

/// Revokes the caller's token and drops their dashboard session
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SignOutResponse>, ApiError> {
    let context = session_context(&state, claims).await?;
    let user = context.require_user().await?;

    let navigation = context.sign_out().await?;
    let had_dashboard = state.sessions.end(&user.id).await;
    info!(user_id = %user.id, had_dashboard, "Session ended");

    Ok(Json(navigation.into()))
}
