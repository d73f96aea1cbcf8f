//! Authentication and authorization
//!
//! API callers present a bearer JWT. The claims carry the user's id, email, and
//! roles, and a `jti` that sign-out adds to the revocation list. `TokenAuth`
//! adapts one request's claims to the domain's `AuthPort`, so the session
//! handlers drive the same `SessionContext` the dashboard uses everywhere else.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use core_kernel::{DomainPort, PortError};
use domain_policy::{AuthPort, AuthUser};

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// User's roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Token id, the unit of revocation
    pub jti: String,
}

impl From<&Claims> for AuthUser {
    fn from(claims: &Claims) -> Self {
        let user = AuthUser::new(claims.sub.as_str());
        let user = match &claims.email {
            Some(email) => user.with_email(email.as_str()),
            None => user,
        };
        claims
            .roles
            .iter()
            .fold(user, |user, role| user.with_role(role.as_str()))
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token revoked")]
    TokenRevoked,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Roles allowed to read the dashboard
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const AGENT: &str = "agent";
    pub const ANALYST: &str = "analyst";

    pub const DASHBOARD_READERS: &[&str] = &[ADMIN, AGENT, ANALYST];
}

/// Creates a new JWT token for `user`
pub fn create_token(user: &AuthUser, secret: &str, expiration_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        roles: user.roles.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Validates a JWT token's signature and expiry
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

fn validation() -> Validation {
    Validation::default()
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Token ids revoked by sign-out, shared across requests
///
/// Each id is kept with its token's `exp`. Once a token is past expiry (plus
/// the validation leeway) it fails validation anyway, so its entry is pruned.
#[derive(Debug, Clone, Default)]
pub struct TokenRevocations {
    revoked: Arc<RwLock<HashMap<String, i64>>>,
}

impl TokenRevocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revokes `jti` until `exp`; returns false if it was already revoked
    ///
    /// Expired entries are pruned on every insert.
    pub async fn revoke(&self, jti: &str, exp: i64) -> bool {
        let mut revoked = self.revoked.write().await;
        prune(&mut revoked, Utc::now().timestamp());
        revoked.insert(jti.to_string(), exp).is_none()
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.read().await.contains_key(jti)
    }

    /// Drops entries whose tokens can no longer validate; returns how many
    pub async fn prune_expired(&self) -> usize {
        prune(&mut *self.revoked.write().await, Utc::now().timestamp())
    }

    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }
}

fn prune(revoked: &mut HashMap<String, i64>, now: i64) -> usize {
    let leeway = validation().leeway as i64;
    let before = revoked.len();
    revoked.retain(|_, exp| *exp + leeway >= now);
    before - revoked.len()
}

/// `AuthPort` over one request's validated claims
pub struct TokenAuth {
    claims: Claims,
    revocations: TokenRevocations,
}

impl TokenAuth {
    pub fn new(claims: Claims, revocations: TokenRevocations) -> Self {
        Self { claims, revocations }
    }
}

impl DomainPort for TokenAuth {}

#[async_trait]
impl AuthPort for TokenAuth {
    async fn current_user(&self) -> Result<Option<AuthUser>, PortError> {
        if self.revocations.is_revoked(&self.claims.jti).await {
            return Ok(None);
        }
        Ok(Some(AuthUser::from(&self.claims)))
    }

    async fn sign_out(&self) -> Result<(), PortError> {
        self.revocations.revoke(&self.claims.jti, self.claims.exp).await;
        Ok(())
    }
}
