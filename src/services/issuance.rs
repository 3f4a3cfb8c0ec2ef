use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use super::{audit_failure, require_segment};
use crate::error::{AdminError, Result};
use crate::security::AuditLogger;
use crate::store::{StoreHandle, TokenAuth, WrapInfo};

/// Token issuance parameters, passed to the store as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenCreateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Issue against `auth/token/create/{role}` instead of the plain endpoint
    #[serde(default, skip_serializing)]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_parent: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_default_policy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_max_ttl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_uses: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewable: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_alias: Option<String>,
}

/// What the store handed back for an issuance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "token", rename_all = "lowercase")]
pub enum IssuedToken {
    Plain(TokenAuth),
    Wrapped(WrapInfo),
}

impl IssuedToken {
    pub fn is_wrapped(&self) -> bool {
        matches!(self, IssuedToken::Wrapped(_))
    }
}

/// Create a token. A non-empty `wrap_ttl` wraps this one response.
pub async fn create_token(
    handle: &StoreHandle,
    request: &TokenCreateRequest,
    wrap_ttl: Option<&str>,
) -> Result<IssuedToken> {
    let wrap_ttl = wrap_ttl.map(str::trim).filter(|t| !t.is_empty());
    let path = match request.role.as_deref() {
        Some(role) => {
            require_segment(role, "role name")?;
            format!("auth/token/create/{role}")
        }
        None => "auth/token/create".to_string(),
    };

    let body = serde_json::to_value(request)
        .map_err(|e| AdminError::conversion(format!("encoding token request: {e}")))?;

    let secret = match handle.write(&path, Some(&body), wrap_ttl).await {
        Ok(secret) => secret.unwrap_or_default(),
        Err(e) => {
            audit_failure(handle, "create_token", &e);
            return Err(e);
        }
    };

    let issued = match (wrap_ttl, secret.wrap_info, secret.auth) {
        (Some(_), Some(wrap), _) => IssuedToken::Wrapped(wrap),
        (Some(_), None, _) => {
            return Err(AdminError::conversion("wrapped response carries no wrap info"))
        }
        (None, _, Some(auth)) => IssuedToken::Plain(auth),
        (None, _, None) => {
            return Err(AdminError::conversion("token response carries no auth data"))
        }
    };

    AuditLogger::new().token_created(
        &handle.caller().display_name,
        issued.is_wrapped(),
        request.policies.len(),
    );
    info!(wrapped = issued.is_wrapped(), "Token created");
    Ok(issued)
}
