//! Connection to the secret store: transport, handles and session resolution.

pub mod session;
pub mod vault_client;

pub use session::{AuthSession, SessionResolver};
pub use vault_client::{CallerIdentity, Secret, StoreHandle, TokenAuth, VaultClient, WrapInfo};
