use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    10
}

fn default_lookup_concurrency() -> usize {
    8
}

fn default_verify_session() -> bool {
    true
}

/// Connection settings for the secret store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL (e.g., https://127.0.0.1:8200)
    pub address: String,
    /// Per-request timeout applied by the HTTP client
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on in-flight accessor lookups for one batch
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
    /// Check the caller token with lookup-self when resolving a session
    #[serde(default = "default_verify_session")]
    pub verify_session: bool,
}

impl StoreConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout_secs: default_timeout_secs(),
            lookup_concurrency: default_lookup_concurrency(),
            verify_session: default_verify_session(),
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).context("reading config file")?;
        let cfg: StoreConfig = serde_json::from_str(&raw).context("parsing store config")?;
        cfg.validated()
    }

    /// Build the config from environment variables.
    ///
    /// - `VAULT_ADDR`: Base URL (required)
    /// - `VAULT_CLIENT_TIMEOUT`: request timeout in seconds
    /// - `VAULT_LOOKUP_CONCURRENCY`: parallel accessor lookups
    /// - `VAULT_VERIFY_SESSION`: `false` skips the lookup-self check
    pub fn from_env() -> Result<Self> {
        let address = std::env::var("VAULT_ADDR").context("VAULT_ADDR is not set")?;
        let mut cfg = StoreConfig::new(address);

        if let Ok(raw) = std::env::var("VAULT_CLIENT_TIMEOUT") {
            cfg.timeout_secs = raw
                .trim()
                .trim_end_matches('s')
                .parse()
                .context("parsing VAULT_CLIENT_TIMEOUT")?;
        }
        if let Ok(raw) = std::env::var("VAULT_LOOKUP_CONCURRENCY") {
            cfg.lookup_concurrency = raw
                .trim()
                .parse()
                .context("parsing VAULT_LOOKUP_CONCURRENCY")?;
        }
        if let Ok(raw) = std::env::var("VAULT_VERIFY_SESSION") {
            cfg.verify_session = raw.trim().parse().context("parsing VAULT_VERIFY_SESSION")?;
        }

        cfg.validated()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validated(mut self) -> Result<Self> {
        let trimmed = self.address.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            anyhow::bail!("store address must not be empty");
        }
        self.address = trimmed.to_string();
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        if self.lookup_concurrency == 0 {
            self.lookup_concurrency = 1;
        }
        Ok(self)
    }
}
