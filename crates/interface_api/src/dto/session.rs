//! Session DTOs

use serde::Serialize;

use domain_policy::{Navigation, SessionState};

/// Body of `GET /session`
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionState,
    /// Where the client should route this session
    pub landing: &'static str,
}

/// Body of `POST /session/sign-out`
#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub redirect: &'static str,
}

impl From<Navigation> for SignOutResponse {
    fn from(navigation: Navigation) -> Self {
        Self {
            redirect: navigation.path(),
        }
    }
}
