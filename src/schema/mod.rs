//! Mapping from the store's loosely-typed auth backend payloads to typed
//! identity records.

mod raw;
mod records;

pub use raw::RawFields;
pub use records::{AppRole, Identity, UserpassUser};

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{AdminError, Result};
use crate::store::Secret;

/// Auth backends whose identities this crate knows how to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Userpass,
    Approle,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Userpass, BackendKind::Approle];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Userpass => "userpass",
            BackendKind::Approle => "approle",
        }
    }

    /// Store path listing every identity of this kind.
    pub fn list_path(&self) -> &'static str {
        match self {
            BackendKind::Userpass => "auth/userpass/users",
            BackendKind::Approle => "auth/approle/role",
        }
    }

    pub fn entry_path(&self, key: &str) -> String {
        format!("{}/{}", self.list_path(), key)
    }

    /// Name of the unique key field in serialized records.
    pub fn key_field(&self) -> &'static str {
        match self {
            BackendKind::Userpass => "name",
            BackendKind::Approle => "role_id",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "userpass" => Ok(BackendKind::Userpass),
            "approle" => Ok(BackendKind::Approle),
            other => Err(AdminError::BackendUnsupported(other.to_string())),
        }
    }
}

/// Decode a detail payload for `key` into the record type of `kind`.
///
/// Missing fields take their zero value; only a payload that is not a
/// mapping at all is rejected.
pub fn convert(kind: BackendKind, key: &str, raw: &Value) -> Result<Identity> {
    let fields = RawFields::from_value(raw)?;
    Ok(match kind {
        BackendKind::Userpass => Identity::Userpass(UserpassUser::from_fields(key, &fields)),
        BackendKind::Approle => Identity::Approle(AppRole::from_fields(key, &fields)),
    })
}

/// Pull the `keys` array out of a listing response.
///
/// Only an absent response (nothing listed) is empty; a response without a
/// `keys` sequence in its data is a conversion error.
pub fn listed_keys(listing: Option<&Secret>) -> Result<Vec<String>> {
    let Some(listing) = listing else {
        return Ok(Vec::new());
    };
    let keys = listing
        .data
        .as_ref()
        .and_then(|data| data.get("keys"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| AdminError::conversion("listing has no key sequence"))?;

    keys.iter()
        .map(|k| {
            k.as_str()
                .map(str::to_string)
                .ok_or_else(|| AdminError::conversion(format!("non-string key in listing: {k}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("userpass".parse::<BackendKind>().unwrap(), BackendKind::Userpass);
        assert_eq!("approle".parse::<BackendKind>().unwrap(), BackendKind::Approle);
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        for raw in ["ldap", "", "UserPass", "github"] {
            let err = raw.parse::<BackendKind>().unwrap_err();
            assert!(matches!(err, AdminError::BackendUnsupported(ref k) if k == raw));
        }
    }

    #[test]
    fn paths_per_kind() {
        assert_eq!(BackendKind::Userpass.entry_path("bob"), "auth/userpass/users/bob");
        assert_eq!(BackendKind::Approle.entry_path("ci"), "auth/approle/role/ci");
    }

    fn listing(data: Option<Value>) -> Secret {
        Secret {
            data,
            ..Default::default()
        }
    }

    #[test]
    fn listed_keys_keeps_store_order() {
        let secret = listing(Some(json!({"keys": ["zeta", "alpha", "mid"]})));
        assert_eq!(
            listed_keys(Some(&secret)).unwrap(),
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn listed_keys_rejects_non_sequence() {
        let secret = listing(Some(json!({"keys": "alpha"})));
        assert!(matches!(
            listed_keys(Some(&secret)),
            Err(AdminError::DataConversion(_))
        ));
        let secret = listing(Some(json!({"keys": ["alpha", 7]})));
        assert!(matches!(
            listed_keys(Some(&secret)),
            Err(AdminError::DataConversion(_))
        ));
    }

    #[test]
    fn listing_without_data_is_conversion_error() {
        assert!(matches!(
            listed_keys(Some(&listing(None))),
            Err(AdminError::DataConversion(_))
        ));
        assert!(matches!(
            listed_keys(Some(&listing(Some(json!({}))))),
            Err(AdminError::DataConversion(_))
        ));
    }

    #[test]
    fn absent_listing_is_empty() {
        assert!(listed_keys(None).unwrap().is_empty());
    }

    #[test]
    fn convert_dispatches_per_kind() {
        let raw = json!({"ttl": 60, "token_ttl": 60});
        let user = convert(BackendKind::Userpass, "u1", &raw).unwrap();
        let role = convert(BackendKind::Approle, "r1", &raw).unwrap();
        assert_eq!(user.kind(), BackendKind::Userpass);
        assert_eq!(role.kind(), BackendKind::Approle);
        assert_eq!(user.key(), "u1");
        assert_eq!(role.key(), "r1");
    }

    #[test]
    fn convert_rejects_non_mapping() {
        let err = convert(BackendKind::Userpass, "u1", &json!(["not", "a", "map"])).unwrap_err();
        assert!(matches!(err, AdminError::DataConversion(_)));
    }
}
