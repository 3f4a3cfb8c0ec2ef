use tracing::{debug, info, warn};

use super::{audit_failure, require_segment};
use crate::error::{AdminError, Result};
use crate::schema::{self, BackendKind, Identity};
use crate::security::AuditLogger;
use crate::store::StoreHandle;

/// List every identity of `backend`, in the store's listing order.
///
/// A key whose details cannot be fetched or decoded stays in the result as a
/// partial record (key only); it never fails the listing.
pub async fn list_identities(handle: &StoreHandle, backend: &str) -> Result<Vec<Identity>> {
    let kind: BackendKind = backend.parse()?;

    let listing = handle.list(kind.list_path()).await?;
    let keys = schema::listed_keys(listing.as_ref())?;
    debug!(backend = %kind, count = keys.len(), "listed identity keys");

    let mut identities = Vec::with_capacity(keys.len());
    let mut partial = 0usize;
    for key in &keys {
        match fetch_identity(handle, kind, key).await {
            Ok(identity) => identities.push(identity),
            Err(e) => {
                warn!(
                    backend = %kind,
                    key = %key,
                    error = %e,
                    "Failed to fetch identity details, keeping partial record"
                );
                // Continue with the rest of the directory
                partial += 1;
                identities.push(Identity::partial(kind, key));
            }
        }
    }

    info!(
        backend = %kind,
        total = identities.len(),
        partial,
        "Listed identities"
    );
    Ok(identities)
}

async fn fetch_identity(handle: &StoreHandle, kind: BackendKind, key: &str) -> Result<Identity> {
    let secret = handle.read(&kind.entry_path(key)).await?;
    let data = secret.and_then(|s| s.data).unwrap_or_default();
    schema::convert(kind, key, &data)
}

/// Delete one identity. Whether a missing id is an error is up to the store.
pub async fn delete_identity(handle: &StoreHandle, backend: &str, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(AdminError::validation("invalid deletion ID"));
    }
    let kind: BackendKind = backend.parse()?;
    require_segment(id, "deletion ID")?;

    if let Err(e) = handle.delete(&kind.entry_path(id)).await {
        audit_failure(handle, "delete_identity", &e);
        return Err(e);
    }

    AuditLogger::new().identity_deleted(&handle.caller().display_name, kind.as_str(), id);
    Ok(())
}
