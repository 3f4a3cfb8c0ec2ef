pub mod config;
pub mod error;
pub mod schema;
pub mod security;
pub mod services;
pub mod store;
pub mod utils;

pub use error::{AdminError, Result, SessionError, UpstreamError};

// Crate version exposed for runtime queries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
