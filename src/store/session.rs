use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::vault_client::{CallerIdentity, StoreHandle, VaultClient};
use crate::error::{AdminError, SessionError, UpstreamError};

/// Caller credentials handed over by the session layer.
#[derive(Clone)]
pub struct AuthSession {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AuthSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Session from `VAULT_TOKEN`; an unset variable yields an empty session
    /// that fails at resolution.
    pub fn from_env() -> Self {
        Self::new(std::env::var("VAULT_TOKEN").unwrap_or_default())
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| at <= Utc::now()).unwrap_or(false)
    }
}

/// Turns caller sessions into authenticated store handles.
#[derive(Debug, Clone)]
pub struct SessionResolver {
    client: VaultClient,
    verify: bool,
}

impl SessionResolver {
    pub fn new(client: VaultClient, verify: bool) -> Self {
        Self { client, verify }
    }

    pub async fn resolve(&self, session: &AuthSession) -> Result<StoreHandle, SessionError> {
        if session.token.trim().is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        if session.is_expired() {
            return Err(SessionError::Expired);
        }

        let handle = StoreHandle::new(self.client.clone(), session.token.clone());
        if !self.verify {
            return Ok(handle);
        }

        let secret = handle
            .read("auth/token/lookup-self")
            .await
            .map_err(session_failure)?;

        let caller = secret
            .and_then(|s| s.data)
            .map(|data| caller_from(&data))
            .unwrap_or_default();
        debug!(display_name = %caller.display_name, "store session resolved");

        Ok(handle.with_caller(caller))
    }
}

fn caller_from(data: &Value) -> CallerIdentity {
    CallerIdentity {
        display_name: data
            .get("display_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        policies: data
            .get("policies")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|p| p.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn session_failure(err: AdminError) -> SessionError {
    match err {
        AdminError::Upstream(UpstreamError::Status { status, errors }) if status < 500 => {
            warn!(status, "store rejected session token");
            SessionError::Rejected {
                status,
                message: errors.join("; "),
            }
        }
        AdminError::Upstream(other) => SessionError::Unreachable(other.to_string()),
        other => SessionError::Unreachable(other.to_string()),
    }
}
