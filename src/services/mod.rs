//! Store-facing operations. Each takes a resolved [`StoreHandle`], checks its
//! local preconditions before touching the store, and returns typed results.
//!
//! [`StoreHandle`]: crate::store::StoreHandle

pub mod accessors;
pub mod issuance;
pub mod roles;
pub mod users;

use crate::error::{AdminError, Result};
use crate::security::AuditLogger;
use crate::store::StoreHandle;

/// Check that `value` can be placed into a store path as exactly one segment.
pub(crate) fn require_segment(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AdminError::validation(format!("empty {what}")));
    }
    if value.contains('/') || value == "." || value == ".." {
        return Err(AdminError::validation(format!("invalid {what}: {value:?}")));
    }
    Ok(())
}

pub(crate) fn audit_failure(handle: &StoreHandle, operation: &str, err: &AdminError) {
    AuditLogger::new().operation_failed(&handle.caller().display_name, operation, &err.to_string());
}
