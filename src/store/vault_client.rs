use reqwest::header::HeaderValue;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::error::{AdminError, Result, UpstreamError};

const TOKEN_HEADER: &str = "X-Vault-Token";
const WRAP_TTL_HEADER: &str = "X-Vault-Wrap-TTL";

/// Response envelope shared by every Vault API call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub lease_id: String,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    /// Kept raw; the schema layer decides whether it is a usable mapping.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub auth: Option<TokenAuth>,
    #[serde(default)]
    pub wrap_info: Option<WrapInfo>,
}

/// Auth block returned when the store issues a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenAuth {
    #[serde(default)]
    pub client_token: String,
    #[serde(default)]
    pub accessor: String,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub token_policies: Vec<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub orphan: bool,
}

/// Reference to a response-wrapped payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrapInfo {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub accessor: String,
    #[serde(default)]
    pub ttl: u64,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub creation_path: String,
    #[serde(default)]
    pub wrapped_accessor: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Shared HTTP transport to the store. Cheap to clone; holds no caller state.
#[derive(Debug, Clone)]
pub struct VaultClient {
    base_url: String,
    lookup_concurrency: usize,
    http_client: Client,
}

impl VaultClient {
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        if config.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("creating HTTP client")?;

        debug!("Vault client initialized with base_url={}", config.address);

        Ok(VaultClient {
            base_url: config.address.trim_end_matches('/').to_string(),
            lookup_concurrency: config.lookup_concurrency.max(1),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Identity of the token owner, as reported by lookup-self.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallerIdentity {
    pub display_name: String,
    pub policies: Vec<String>,
}

/// Authenticated handle: the shared transport plus one caller token.
///
/// Every request carries its own headers, so a handle can be cloned and used
/// from concurrent tasks without one call's options reaching another.
#[derive(Clone)]
pub struct StoreHandle {
    client: VaultClient,
    token: String,
    caller: CallerIdentity,
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("base_url", &self.client.base_url)
            .field("token", &"<redacted>")
            .field("caller", &self.caller)
            .finish()
    }
}

impl StoreHandle {
    pub fn new(client: VaultClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            caller: CallerIdentity::default(),
        }
    }

    pub fn with_caller(mut self, caller: CallerIdentity) -> Self {
        self.caller = caller;
        self
    }

    pub fn caller(&self) -> &CallerIdentity {
        &self.caller
    }

    pub fn lookup_concurrency(&self) -> usize {
        self.client.lookup_concurrency
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        trace!(method = %method, path = %path, "building store request");
        self.client
            .http_client
            .request(method, self.client.url(path))
            .header(TOKEN_HEADER, &self.token)
    }

    /// List keys under `path`. `Ok(None)` when the store has nothing there.
    pub async fn list(&self, path: &str) -> Result<Option<Secret>> {
        debug!("Listing from Vault: {}", path);

        let response = self
            .request(Method::GET, path)
            .query(&[("list", "true")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await
    }

    /// Read `path`. A missing entry is an upstream 404, not an empty result.
    pub async fn read(&self, path: &str) -> Result<Option<Secret>> {
        debug!("Reading from Vault: {}", path);

        let response = self.request(Method::GET, path).send().await?;
        decode(response).await
    }

    /// Write `body` to `path`. `wrap_ttl` asks the store to wrap this
    /// response only.
    pub async fn write(
        &self,
        path: &str,
        body: Option<&Value>,
        wrap_ttl: Option<&str>,
    ) -> Result<Option<Secret>> {
        debug!(wrapped = wrap_ttl.is_some(), "Writing to Vault: {}", path);

        let mut request = self.request(Method::POST, path);
        if let Some(ttl) = wrap_ttl {
            let value = HeaderValue::from_str(ttl)
                .map_err(|_| AdminError::validation(format!("invalid wrap TTL: {ttl:?}")))?;
            request = request.header(WRAP_TTL_HEADER, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        debug!("Deleting from Vault: {}", path);

        let response = self.request(Method::DELETE, path).send().await?;
        decode(response).await.map(|_| ())
    }
}

async fn decode(response: Response) -> Result<Option<Secret>> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let errors = if parsed.errors.is_empty() && !body.trim().is_empty() {
            vec![body.trim().to_string()]
        } else {
            parsed.errors
        };
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            errors,
        }
        .into());
    }

    if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Secret>(&body)
        .map(Some)
        .map_err(|e| AdminError::conversion(format!("undecodable store response: {e}")))
}
