use serde::Serialize;

use super::{BackendKind, RawFields};

/// A userpass identity. Durations are in seconds; 0 means inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserpassUser {
    pub name: String,
    pub ttl: i64,
    pub max_ttl: i64,
    /// Comma-delimited policy names
    pub policies: String,
}

impl UserpassUser {
    pub fn partial(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn from_fields(name: &str, raw: &RawFields) -> Self {
        Self {
            name: name.to_string(),
            ttl: raw.integer(&["ttl", "token_ttl"]),
            max_ttl: raw.integer(&["max_ttl", "token_max_ttl"]),
            policies: raw.text(&["policies", "token_policies"]),
        }
    }
}

/// An approle role definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppRole {
    pub role_id: String,
    pub token_ttl: i64,
    pub token_max_ttl: i64,
    pub secret_id_ttl: i64,
    pub secret_id_num_uses: i64,
    pub policies: Vec<String>,
    pub period: i64,
    pub bind_secret_id: bool,
    pub bound_cidr_list: String,
}

impl AppRole {
    pub fn partial(role_id: &str) -> Self {
        Self {
            role_id: role_id.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn from_fields(role_id: &str, raw: &RawFields) -> Self {
        Self {
            role_id: role_id.to_string(),
            token_ttl: raw.integer(&["token_ttl"]),
            token_max_ttl: raw.integer(&["token_max_ttl"]),
            secret_id_ttl: raw.integer(&["secret_id_ttl"]),
            secret_id_num_uses: raw.integer(&["secret_id_num_uses"]),
            policies: raw.list(&["policies", "token_policies"]),
            period: raw.integer(&["period", "token_period"]),
            bind_secret_id: raw.flag(&["bind_secret_id"]),
            bound_cidr_list: raw.text(&["bound_cidr_list", "secret_id_bound_cidrs"]),
        }
    }
}

/// One identity of any supported backend kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Identity {
    Userpass(UserpassUser),
    Approle(AppRole),
}

impl Identity {
    /// A record with only its key set.
    pub fn partial(kind: BackendKind, key: &str) -> Self {
        match kind {
            BackendKind::Userpass => Identity::Userpass(UserpassUser::partial(key)),
            BackendKind::Approle => Identity::Approle(AppRole::partial(key)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Identity::Userpass(_) => BackendKind::Userpass,
            Identity::Approle(_) => BackendKind::Approle,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Identity::Userpass(u) => &u.name,
            Identity::Approle(r) => &r.role_id,
        }
    }

    pub fn is_partial(&self) -> bool {
        *self == Identity::partial(self.kind(), self.key())
    }
}
