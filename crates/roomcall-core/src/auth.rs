use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::errors::RoomcallError;

/// Identity and access token returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub identity: String,
    pub token: String,
}

/// Source of fresh credentials.
#[async_trait]
pub trait TokenTransport: Send + Sync {
    async fn fetch_credentials(&self) -> Result<Credentials, RoomcallError>;
}

/// Requests credentials with `GET {backend}/token`.
pub struct HttpTokenTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTokenTransport {
    pub fn new(backend_url: &str) -> Result<Self, RoomcallError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: Self::token_endpoint(backend_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolve the token endpoint below `backend_url`, keeping any path prefix.
    fn token_endpoint(backend_url: &str) -> Result<Url, RoomcallError> {
        let mut base = Url::parse(backend_url.trim())
            .map_err(|e| RoomcallError::InvalidUrl(format!("'{backend_url}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(RoomcallError::InvalidUrl(format!(
                "expected http(s) backend URL, got '{backend_url}'"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("token")
            .map_err(|e| RoomcallError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl TokenTransport for HttpTokenTransport {
    async fn fetch_credentials(&self) -> Result<Credentials, RoomcallError> {
        tracing::info!("requesting token from {}", self.endpoint);

        let resp = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| RoomcallError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(RoomcallError::Auth(format!(
                "token endpoint returned status {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| RoomcallError::Auth(format!("invalid token response: {e}")))
    }
}

/// Fetches credentials once and serves them from cache afterwards.
///
/// Failures are not cached. Concurrent first callers share one request.
pub struct TokenFetcher {
    transport: Arc<dyn TokenTransport>,
    cached: OnceCell<Credentials>,
}

impl TokenFetcher {
    pub fn new(transport: Arc<dyn TokenTransport>) -> Self {
        Self {
            transport,
            cached: OnceCell::new(),
        }
    }

    pub async fn fetch(&self) -> Result<Credentials, RoomcallError> {
        if let Some(credentials) = self.cached.get() {
            return Ok(credentials.clone());
        }
        self.cached
            .get_or_try_init(|| self.transport.fetch_credentials())
            .await
            .cloned()
    }

    pub fn identity(&self) -> Option<&str> {
        self.cached.get().map(|c| c.identity.as_str())
    }
}
