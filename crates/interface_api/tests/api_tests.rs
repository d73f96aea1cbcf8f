//! HTTP API Tests
//!
//! Drives the full router with `tower::ServiceExt::oneshot` over the in-memory
//! gateway seeded with the standard policy book.
//!
//! # Test Organization
//!
//! - `health` - Liveness and gateway readiness
//! - `policies` - Paged list, lookup, validation, upstream failures
//! - `dashboard` - Per-user session, filters, options, roles
//! - `session` - Session state and sign-out

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use domain_policy::adapters::MockGateway;
use domain_policy::{AuthUser, Table};
use interface_api::auth::create_token;
use interface_api::config::{ApiConfig, GatewayBackend};
use interface_api::{create_router, router_with_state, AppState};
use serde_json::{json, Value};
use test_utils::*;
use tower::ServiceExt;

const SECRET: &str = "api-test-secret";

fn config() -> ApiConfig {
    ApiConfig {
        jwt_secret: SECRET.to_string(),
        backend: GatewayBackend::Postgres,
        ..ApiConfig::default()
    }
}

fn token_for(user: &AuthUser) -> String {
    create_token(user, SECRET, 300).unwrap()
}

async fn app() -> (Router, Arc<MockGateway>) {
    let gateway = Arc::new(seeded_gateway().await);
    (create_router(gateway.clone(), config()), gateway)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

// ============================================================================
// HEALTH
// ============================================================================

mod health {
    use super::*;

    #[tokio::test]
    async fn test_liveness_needs_no_token() {
        let (app, _) = app().await;

        let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_follows_gateway_health() {
        let (app, gateway) = app().await;

        let (status, body) = send(&app, request(Method::GET, "/health/ready", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gateway"], "mock-gateway");

        gateway.set_healthy(false);
        let (status, body) = send(&app, request(Method::GET, "/health/ready", None, None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }
}

// ============================================================================
// POLICIES
// ============================================================================

mod policies {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _) = app().await;

        let (status, body) = send(&app, request(Method::GET, "/api/v1/policies", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_foreign_token_is_unauthorized() {
        let (app, _) = app().await;
        let forged = create_token(&UserFixtures::agent(), "someone-else", 300).unwrap();

        let (status, _) = get(&app, "/api/v1/policies", &forged).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_paged_list_newest_first() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = get(&app, "/api/v1/policies?page=1&page_size=2", &token).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 5);
        assert_eq!(body["total_pages"], 3);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][0]["id"], "pol-east-3");
    }

    #[tokio::test]
    async fn test_list_filters_by_region() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = get(&app, "/api/v1/policies?region=East&sort_by=created_at&order=asc", &token).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["data"][0]["id"], "pol-east-1");
    }

    #[tokio::test]
    async fn test_invalid_paging_is_unprocessable() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = get(&app, "/api/v1/policies?page_size=0", &token).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_unknown_sort_column_is_bad_request() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, _) = get(&app, "/api/v1/policies?sort_by=colour", &token).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_policy() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = get(&app, "/api/v1/policies/pol-west-1", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["region"], "West");
        assert_eq!(body["status"], "Pending");

        let (status, body) = get(&app, "/api/v1/policies/pol-missing", &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_gateway_failure_is_bad_gateway() {
        let (app, gateway) = app().await;
        gateway.fail_table(Table::Policies, "connection reset").await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = get(&app, "/api/v1/policies", &token).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upstream_error");
    }
}

// ============================================================================
// DASHBOARD
// ============================================================================

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn test_first_request_starts_the_dashboard() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = get(&app, "/api/v1/dashboard", &token).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total"], 5);
        assert_eq!(body["summary"]["active"], 2);
        assert_eq!(body["summary"]["pending"], 1);
        assert_eq!(body["summary"]["expired"], 1);
        assert_eq!(body["policies"].as_array().unwrap().len(), 5);
        assert_eq!(body["filters"]["region"], Value::Null);
    }

    #[tokio::test]
    async fn test_filters_persist_across_requests() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = send(
            &app,
            request(
                Method::PUT,
                "/api/v1/dashboard/filters",
                Some(&token),
                Some(json!({ "key": "region", "value": "East" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total"], 3);
        assert_eq!(body["filters"]["region"], "East");

        let (_, body) = get(&app, "/api/v1/dashboard", &token).await;
        assert_eq!(body["summary"]["total"], 3);

        let (status, body) = send(
            &app,
            request(Method::DELETE, "/api/v1/dashboard/filters", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total"], 5);
        assert_eq!(body["filters"]["region"], Value::Null);
    }

    #[tokio::test]
    async fn test_sessions_are_per_user() {
        let (app, _) = app().await;
        let agent = token_for(&UserFixtures::agent());
        let admin = token_for(&UserFixtures::admin());

        send(
            &app,
            request(
                Method::PUT,
                "/api/v1/dashboard/filters",
                Some(&agent),
                Some(json!({ "key": "region", "value": "West" })),
            ),
        )
        .await;

        let (_, body) = get(&app, "/api/v1/dashboard", &admin).await;
        assert_eq!(body["summary"]["total"], 5);
    }

    #[tokio::test]
    async fn test_bad_filters_are_rejected() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, _) = send(
            &app,
            request(
                Method::PUT,
                "/api/v1/dashboard/filters",
                Some(&token),
                Some(json!({ "key": "colour", "value": "blue" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            request(
                Method::PUT,
                "/api/v1/dashboard/filters",
                Some(&token),
                Some(json!({ "key": "startDate", "value": "01/02/2024" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_options() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = get(&app, "/api/v1/dashboard/options", &token).await;

        assert_eq!(status, StatusCode::OK);
        let regions = body["regions"].as_array().unwrap();
        assert_eq!(regions.len(), 2);
        assert!(regions.contains(&json!("East")));
        assert!(regions.contains(&json!("West")));
        assert_eq!(body["agents"].as_array().unwrap().len(), 2);
        assert_eq!(body["policy_types"], json!(["Life", "Auto", "Home"]));
    }

    #[tokio::test]
    async fn test_user_without_reader_role_is_forbidden() {
        let (app, _) = app().await;
        let token = token_for(&AuthUser::new("user-guest"));

        let (status, body) = get(&app, "/api/v1/dashboard", &token).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_failed_first_load_is_retried() {
        let (app, gateway) = app().await;
        gateway.fail_table(Table::Policies, "connection reset").await;
        let token = token_for(&UserFixtures::agent());

        let (status, _) = get(&app, "/api/v1/dashboard", &token).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        gateway.heal_table(Table::Policies).await;
        let (status, body) = get(&app, "/api/v1/dashboard", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total"], 5);
    }
}

// ============================================================================
// SESSION
// ============================================================================

mod session {
    use super::*;

    #[tokio::test]
    async fn test_session_state() {
        let (app, _) = app().await;
        let token = token_for(&UserFixtures::agent());

        let (status, body) = get(&app, "/api/v1/session", &token).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["state"], "authenticated");
        assert_eq!(body["session"]["user"]["id"], "user-agent");
        assert_eq!(body["landing"], "/dashboard");
    }

    #[tokio::test]
    async fn test_sign_out_revokes_token_and_ends_dashboard() {
        let gateway = Arc::new(seeded_gateway().await);
        let state = AppState::new(gateway, config());
        let app = router_with_state(state.clone());
        let token = token_for(&UserFixtures::agent());

        get(&app, "/api/v1/dashboard", &token).await;
        assert_eq!(state.sessions.active().await, 1);

        let (status, body) = send(
            &app,
            request(Method::POST, "/api/v1/session/sign-out", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "redirect": "/signin" }));
        assert_eq!(state.sessions.active().await, 0);

        let (status, body) = get(&app, "/api/v1/session", &token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token revoked");
    }
}
