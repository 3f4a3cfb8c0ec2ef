use tracing::{info, warn};

/// Audit events for operations that change or expose token state.
///
/// Accessor and token values are never part of an event.
#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn identity_deleted(&self, caller: &str, backend: &str, id: &str) {
        info!(target: "audit", event = "identity_deleted", caller, backend, id);
    }

    pub fn token_created(&self, caller: &str, wrapped: bool, policy_count: usize) {
        info!(target: "audit", event = "token_created", caller, wrapped, policy_count);
    }

    pub fn token_revoked(&self, caller: &str) {
        info!(target: "audit", event = "token_revoked", caller);
    }

    pub fn accessors_looked_up(&self, caller: &str, requested: usize, resolved: usize) {
        info!(target: "audit", event = "accessors_looked_up", caller, requested, resolved);
    }

    pub fn operation_failed(&self, caller: &str, operation: &str, error_msg: &str) {
        warn!(target: "audit", event = "operation_failed", caller, operation, error = error_msg);
    }
}
