//! Policy handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use tracing::debug;

use core_kernel::PolicyId;
use domain_policy::{Policy, PolicyQueryService};

use crate::auth::Claims;
use crate::dto::policy::*;
use crate::{error::ApiError, AppState};

fn service_for(state: &AppState, claims: &Claims) -> PolicyQueryService {
    PolicyQueryService::new(Arc::clone(&state.gateway)).on_behalf_of(claims.sub.as_str())
}

/// Lists one page of policies
pub async fn list_policies(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListPoliciesQuery>,
) -> Result<Json<PolicyPageResponse>, ApiError> {
    let request = query.into_page_request()?;
    debug!(page = request.page, page_size = request.page_size, "Listing policies");

    let page = service_for(&state, &claims).fetch_page(request).await?;
    Ok(Json(page.into()))
}

/// Gets a policy by ID
pub async fn get_policy(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Policy>, ApiError> {
    let policy = service_for(&state, &claims)
        .fetch_policy(&PolicyId::new(id))
        .await?;
    Ok(Json(policy))
}
