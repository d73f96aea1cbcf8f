//! Session context
//!
//! Replaces ambient auth state with an explicit object: it is constructed with
//! an `AuthPort`, initialised once, and torn down on sign-out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use core_kernel::UserId;

use crate::error::{DashboardError, DashboardResult};
use crate::ports::AuthPort;

/// The signed-in user as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            roles: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum SessionState {
    /// `init` has not run, or the session was torn down
    #[default]
    Uninitialized,
    Anonymous,
    Authenticated(AuthUser),
}

impl SessionState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Where the presentation layer should go next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    SignIn,
    Dashboard,
}

impl Navigation {
    pub fn path(&self) -> &'static str {
        match self {
            Navigation::SignIn => "/signin",
            Navigation::Dashboard => "/dashboard",
        }
    }
}

pub struct SessionContext {
    auth: Arc<dyn AuthPort>,
    state: RwLock<SessionState>,
}

impl SessionContext {
    pub fn new(auth: Arc<dyn AuthPort>) -> Self {
        Self {
            auth,
            state: RwLock::new(SessionState::Uninitialized),
        }
    }

    /// Resolves the current user with the auth provider
    pub async fn init(&self) -> DashboardResult<SessionState> {
        let state = match self.auth.current_user().await? {
            Some(user) => SessionState::Authenticated(user),
            None => SessionState::Anonymous,
        };
        *self.state.write().await = state.clone();
        Ok(state)
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Landing view for the current state
    pub async fn landing(&self) -> Navigation {
        match &*self.state.read().await {
            SessionState::Authenticated(_) => Navigation::Dashboard,
            _ => Navigation::SignIn,
        }
    }

    pub async fn require_user(&self) -> DashboardResult<AuthUser> {
        self.state
            .read()
            .await
            .user()
            .cloned()
            .ok_or(DashboardError::Unauthenticated)
    }

    /// Requires a signed-in user holding one of `allowed_roles`
    ///
    /// An empty list admits any signed-in user.
    pub async fn authorize(&self, allowed_roles: &[&str]) -> DashboardResult<AuthUser> {
        let user = self.require_user().await?;
        if allowed_roles.is_empty() || allowed_roles.iter().any(|role| user.has_role(role)) {
            return Ok(user);
        }
        Err(DashboardError::Forbidden(format!(
            "requires one of: {}",
            allowed_roles.join(", ")
        )))
    }

    /// Signs out with the auth provider and tears the session down
    ///
    /// On failure the session is left as it was.
    pub async fn sign_out(&self) -> DashboardResult<Navigation> {
        if let Err(e) = self.auth.sign_out().await {
            warn!(error = %e, "Sign-out failed");
            return Err(DashboardError::SignOutFailed(e));
        }
        let previous = self.teardown().await;
        if let Some(user) = previous.user() {
            info!(user_id = %user.id, "User signed out");
        }
        Ok(Navigation::SignIn)
    }

    /// Clears local session state, returning what it held
    pub async fn teardown(&self) -> SessionState {
        std::mem::take(&mut *self.state.write().await)
    }
}
