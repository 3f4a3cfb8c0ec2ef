use futures::future::join_all;
use serde_json::{json, Map, Value};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::audit_failure;
use crate::error::{AdminError, Result};
use crate::schema;
use crate::security::AuditLogger;
use crate::store::StoreHandle;

/// Hard cap on accessors per lookup batch.
pub const MAX_ACCESSORS_PER_LOOKUP: usize = 500;

const ACCESSOR_INDEX_PATH: &str = "auth/token/accessors";
const LOOKUP_PATH: &str = "auth/token/lookup-accessor";
const REVOKE_PATH: &str = "auth/token/revoke-accessor";

/// Token properties as reported by the store; not normalized further.
pub type TokenMetadata = Map<String, Value>;

/// All outstanding token accessors.
pub async fn list_accessors(handle: &StoreHandle) -> Result<Vec<String>> {
    let listing = handle.list(ACCESSOR_INDEX_PATH).await?;
    let accessors = schema::listed_keys(listing.as_ref())
        .map_err(|_| AdminError::conversion("failed to fetch token accessors"))?;

    debug!(count = accessors.len(), "listed token accessors");
    Ok(accessors)
}

pub async fn count_accessors(handle: &StoreHandle) -> Result<usize> {
    list_accessors(handle).await.map(|a| a.len())
}

/// Look up each accessor in the comma-delimited `accessors_csv`.
///
/// Slot `i` of the result belongs to accessor `i` of the input. A lookup
/// that fails (invalid, expired or revoked accessor, or a store error)
/// leaves `None` in its slot.
pub async fn lookup_by_accessors(
    handle: &StoreHandle,
    accessors_csv: &str,
) -> Result<Vec<Option<TokenMetadata>>> {
    let accessors: Vec<&str> = accessors_csv.split(',').collect();
    if accessors.len() == 1 && accessors[0].is_empty() {
        return Err(AdminError::validation("no accessors provided"));
    }
    if accessors.len() > MAX_ACCESSORS_PER_LOOKUP {
        return Err(AdminError::validation(format!(
            "maximum number of accessors: {MAX_ACCESSORS_PER_LOOKUP}"
        )));
    }

    let permits = Semaphore::new(handle.lookup_concurrency());
    let permits = &permits;
    let lookups = accessors
        .iter()
        .enumerate()
        .map(|(position, accessor)| async move {
            if accessor.is_empty() {
                return None;
            }
            let _permit = permits.acquire().await.ok()?;
            lookup_one(handle, position, accessor).await
        });
    let tokens = join_all(lookups).await;

    let resolved = tokens.iter().filter(|t| t.is_some()).count();
    AuditLogger::new().accessors_looked_up(
        &handle.caller().display_name,
        accessors.len(),
        resolved,
    );
    Ok(tokens)
}

async fn lookup_one(
    handle: &StoreHandle,
    position: usize,
    accessor: &str,
) -> Option<TokenMetadata> {
    let body = json!({ "accessor": accessor });
    match handle.write(LOOKUP_PATH, Some(&body), None).await {
        Ok(Some(secret)) => match secret.data {
            Some(Value::Object(data)) => Some(data),
            _ => {
                debug!(position, "accessor lookup returned no token data");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            // invalid or expired accessors are expected here
            debug!(position, error = %e, "accessor lookup failed");
            None
        }
    }
}

/// Revoke the token behind `accessor`, along with its children.
pub async fn revoke_by_accessor(handle: &StoreHandle, accessor: &str) -> Result<()> {
    if accessor.trim().is_empty() {
        return Err(AdminError::validation("no accessor provided"));
    }

    let body = json!({ "accessor": accessor });
    if let Err(e) = handle.write(REVOKE_PATH, Some(&body), None).await {
        audit_failure(handle, "revoke_by_accessor", &e);
        return Err(e);
    }

    AuditLogger::new().token_revoked(&handle.caller().display_name);
    info!("Token revoked by accessor");
    Ok(())
}
