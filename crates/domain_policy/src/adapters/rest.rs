//! REST Platform Adapter
//!
//! Implements `DataGateway` and `AuthPort` over the hosted platform's HTTP API.
//!
//! # Wire format
//!
//! A `GatewayQuery` becomes one request:
//!
//! ```text
//! GET {base}/rest/v1/policies?select=*&region=eq.East&order=created_at.desc
//! apikey: <key>
//! Authorization: Bearer <token>
//! Prefer: count=exact
//! Range-Unit: items
//! Range: 10-19
//! ```
//!
//! The exact count comes back in `Content-Range` (`10-19/57`, or `*/0` when
//! nothing matched).
//!
//! # Error Handling
//!
//! HTTP errors are mapped to `PortError` variants:
//! - 401/403 -> `PortError::Unauthorized`
//! - 404 -> `PortError::NotFound`
//! - 416 -> empty page (range past the last row)
//! - 429 -> `PortError::RateLimited`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - Timeouts -> `PortError::Timeout`
//! - Other -> `PortError::Internal`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_RANGE, RANGE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError, UserId};

use crate::ports::{AuthPort, DataGateway};
use crate::query::{GatewayQuery, QueryResponse};
use crate::session::AuthUser;

/// Configuration for the REST adapters
#[derive(Debug, Clone)]
pub struct RestGatewayConfig {
    /// Project URL, e.g. "https://project.example.co"
    pub base_url: String,

    /// Public API key sent as `apikey` on every request
    pub api_key: String,

    /// The user's access token. Without one the API key is used as bearer.
    pub access_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RestGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            access_token: None,
            timeout_secs: 30,
        }
    }
}

impl RestGatewayConfig {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    fn build_client(&self) -> Result<Client, PortError> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })
    }
}

/// Renders the query string for a gateway query
///
/// Row windows travel in the `Range` header, so only `limit` appears here.
pub fn query_params(query: &GatewayQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.selection.render())];

    for predicate in &query.predicates {
        params.push((
            predicate.column.to_string(),
            format!("{}.{}", predicate.comparison.keyword(), predicate.value.render()),
        ));
    }

    if !query.ordering.is_empty() {
        let order = query
            .ordering
            .iter()
            .map(|o| format!("{}.{}", o.column, o.order.keyword()))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

/// Total from a `Content-Range` value such as `0-9/57` or `*/0`
///
/// Returns `None` when the total is unknown (`0-9/*`) or the value is malformed.
pub fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}

fn transport_error(error: reqwest::Error, operation: &str, timeout_secs: u64) -> PortError {
    if error.is_timeout() {
        return PortError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout_secs * 1000,
        };
    }
    PortError::Connection {
        message: format!("{} request failed", operation),
        source: Some(Box::new(error)),
    }
}

fn status_error(status: StatusCode, headers: &HeaderMap, body: String, resource: &str) -> PortError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        body
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::unauthorized(message),
        StatusCode::NOT_FOUND => PortError::not_found("resource", resource),
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited {
            retry_after_secs: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(1),
        },
        StatusCode::BAD_REQUEST => PortError::validation(message),
        s if s.is_server_error() => PortError::ServiceUnavailable {
            service: format!("{} ({})", resource, s),
        },
        _ => PortError::internal(format!("unexpected status {}: {}", status, message)),
    }
}

/// `DataGateway` over the platform's REST endpoint
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: Client,
    config: RestGatewayConfig,
}

impl RestGateway {
    pub fn new(config: RestGatewayConfig) -> Result<Self, PortError> {
        Ok(Self {
            client: config.build_client()?,
            config,
        })
    }

    /// Shares an existing client, e.g. with `RestAuth`
    pub fn with_client(client: Client, config: RestGatewayConfig) -> Self {
        Self { client, config }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

impl DomainPort for RestGateway {}

#[async_trait]
impl HealthCheckable for RestGateway {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let request = self
            .config
            .authorize(self.client.get(self.config.endpoint("rest/v1/")));

        let result = request.send().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) if response.status().is_success() => {
                HealthCheckResult::healthy("rest-gateway", latency_ms)
            }
            Ok(response) => HealthCheckResult::unhealthy(
                "rest-gateway",
                latency_ms,
                format!("status {}", response.status()),
            ),
            Err(e) => HealthCheckResult::unhealthy("rest-gateway", latency_ms, e.to_string()),
        }
    }
}

#[async_trait]
impl DataGateway for RestGateway {
    async fn execute(
        &self,
        query: GatewayQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<QueryResponse, PortError> {
        let start = Instant::now();
        let table = query.table.name();
        let url = self.config.endpoint(&format!("rest/v1/{}", table));

        let mut request = self
            .config
            .authorize(self.client.get(&url))
            .query(&query_params(&query));

        if query.count_exact {
            request = request.header("Prefer", "count=exact");
        }
        if let Some((from, to)) = query.range_bounds() {
            request = request
                .header("Range-Unit", "items")
                .header(RANGE, format!("{}-{}", from, to));
        }
        if let Some(correlation_id) = metadata.as_ref().and_then(|m| m.correlation_id.as_deref()) {
            request = request.header("x-request-id", correlation_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, "execute", self.config.timeout_secs))?;

        let status = response.status();
        let count = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);

        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            debug!(table, ?count, "Requested range is past the last row");
            return Ok(QueryResponse::new(Vec::new(), count));
        }

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            warn!(table, status = status.as_u16(), "Gateway query rejected");
            return Err(status_error(status, &headers, body, table));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| PortError::transformation(format!("{} response: {}", table, e)))?;

        debug!(
            table,
            rows = rows.len(),
            ?count,
            latency_ms = start.elapsed().as_millis() as u64,
            "Gateway query executed"
        );

        Ok(QueryResponse::new(rows, count))
    }
}

/// User record returned by `GET /auth/v1/user`
#[derive(Debug, Deserialize)]
struct PlatformUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    role: Option<String>,
}

impl From<PlatformUser> for AuthUser {
    fn from(user: PlatformUser) -> Self {
        let mut roles = user.app_metadata.roles;
        if let Some(role) = user.app_metadata.role {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        AuthUser {
            id: UserId::new(user.id),
            email: user.email,
            roles,
        }
    }
}

/// `AuthPort` over the platform's auth endpoints
#[derive(Debug, Clone)]
pub struct RestAuth {
    client: Client,
    config: RestGatewayConfig,
}

impl RestAuth {
    pub fn new(config: RestGatewayConfig) -> Result<Self, PortError> {
        Ok(Self {
            client: config.build_client()?,
            config,
        })
    }

    pub fn with_client(client: Client, config: RestGatewayConfig) -> Self {
        Self { client, config }
    }
}

impl DomainPort for RestAuth {}

#[async_trait]
impl AuthPort for RestAuth {
    async fn current_user(&self) -> Result<Option<AuthUser>, PortError> {
        if self.config.access_token.is_none() {
            return Ok(None);
        }

        let response = self
            .config
            .authorize(self.client.get(self.config.endpoint("auth/v1/user")))
            .send()
            .await
            .map_err(|e| transport_error(e, "current_user", self.config.timeout_secs))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!("Access token rejected; treating session as anonymous");
            return Ok(None);
        }
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &headers, body, "auth/v1/user"));
        }

        let user: PlatformUser = response
            .json()
            .await
            .map_err(|e| PortError::transformation(format!("auth user response: {}", e)))?;
        Ok(Some(user.into()))
    }

    async fn sign_out(&self) -> Result<(), PortError> {
        if self.config.access_token.is_none() {
            return Ok(());
        }

        let response = self
            .config
            .authorize(self.client.post(self.config.endpoint("auth/v1/logout")))
            .send()
            .await
            .map_err(|e| transport_error(e, "sign_out", self.config.timeout_secs))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &headers, body, "auth/v1/logout"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PolicyField, RowRange, Selection, SortOrder, Table};

    #[test]
    fn test_query_params_render_predicates_and_order() {
        let query = GatewayQuery::from(Table::Policies)
            .eq(PolicyField::Region, "East")
            .gte(PolicyField::CreatedAt, chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .order(PolicyField::CreatedAt, SortOrder::Ascending)
            .range(RowRange::for_page(2, 10));

        let params = query_params(&query);
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("region".to_string(), "eq.East".to_string()),
                ("created_at".to_string(), "gte.2024-01-01".to_string()),
                ("order".to_string(), "created_at.asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_projection_and_limit() {
        let query = GatewayQuery::from(Table::PolicyTypes)
            .select(Selection::Columns(vec!["name"]))
            .limit(100);

        let params = query_params(&query);
        assert_eq!(params[0], ("select".to_string(), "name".to_string()));
        assert_eq!(params[1], ("limit".to_string(), "100".to_string()));
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-9/57"), Some(57));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_status_mapping() {
        let headers = HeaderMap::new();
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, &headers, String::new(), "policies"),
            PortError::Unauthorized { .. }
        ));
        assert!(status_error(StatusCode::NOT_FOUND, &headers, String::new(), "policies").is_not_found());
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, &headers, String::new(), "policies"),
            PortError::ServiceUnavailable { .. }
        ));

        let mut limited = HeaderMap::new();
        limited.insert(RETRY_AFTER, "7".parse().unwrap());
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, &limited, String::new(), "policies"),
            PortError::RateLimited { retry_after_secs: 7 }
        ));
    }

    #[test]
    fn test_platform_user_roles() {
        let user: PlatformUser = serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "email": "agent@example.com",
            "app_metadata": { "role": "agent", "roles": ["viewer"] }
        }))
        .unwrap();

        let user = AuthUser::from(user);
        assert_eq!(user.roles, vec!["viewer".to_string(), "agent".to_string()]);
    }
}
