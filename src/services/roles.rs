use serde_json::{Map, Value};
use tracing::debug;

use super::require_segment;
use crate::error::{AdminError, Result};
use crate::schema;
use crate::store::StoreHandle;

const ROLES_PATH: &str = "auth/token/roles";

/// A token role's configuration as stored.
pub type RoleConfig = Map<String, Value>;

/// Names of all token roles; empty when none exist yet.
pub async fn list_roles(handle: &StoreHandle) -> Result<Vec<String>> {
    let Some(listing) = handle.list(ROLES_PATH).await? else {
        debug!("no token roles defined");
        return Ok(Vec::new());
    };
    schema::listed_keys(Some(&listing))
}

pub async fn get_role(handle: &StoreHandle, name: &str) -> Result<RoleConfig> {
    if name.is_empty() {
        return Err(AdminError::validation("empty rolename"));
    }
    require_segment(name, "role name")?;

    let secret = handle.read(&format!("{ROLES_PATH}/{name}")).await?;
    match secret.and_then(|s| s.data) {
        Some(Value::Object(config)) => Ok(config),
        None | Some(Value::Null) => Ok(RoleConfig::new()),
        Some(other) => Err(AdminError::conversion(format!(
            "role {name} is not a mapping: {other}"
        ))),
    }
}
