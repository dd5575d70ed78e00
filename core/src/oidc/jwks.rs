//! Public key set handling
//!
//! Fetches a provider's published signing keys.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PROVIDER_REQUEST_TIMEOUT_SECS;
use crate::error::{AuthError, Result};
use crate::platform::HttpClient;
use crate::request::{Method, OutboundRequest};

/// One published RSA public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(rename = "kty", default)]
    pub key_type: String,

    #[serde(rename = "kid", default)]
    pub key_id: String,

    #[serde(rename = "use", default)]
    pub usage: String,

    #[serde(rename = "alg", default)]
    pub algorithm: String,

    /// Modulus, base64url big-endian
    #[serde(rename = "n", default)]
    pub modulus: String,

    /// Exponent, base64url big-endian
    #[serde(rename = "e", default)]
    pub exponent: String,
}

/// Keys document as served by a provider's keys endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeySet {
    pub keys: Vec<PublicKey>,
}

impl PublicKeySet {
    /// First key matching both algorithm and key id
    ///
    /// Keys without a key id never match.
    pub fn find(&self, algorithm: &str, key_id: &str) -> Option<&PublicKey> {
        self.keys
            .iter()
            .find(|k| !k.key_id.is_empty() && k.algorithm == algorithm && k.key_id == key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Fetch the key set published at `endpoint`
pub async fn fetch_key_set(
    endpoint: &str,
    proxy_url: Option<&str>,
    http: &dyn HttpClient,
) -> Result<PublicKeySet> {
    let response = OutboundRequest::new(endpoint, Method::Get, proxy_url)
        .with_timeout(Duration::from_secs(PROVIDER_REQUEST_TIMEOUT_SECS))
        .with_header("Accept", "application/json")
        .send(http)
        .await?;

    if !response.is_ok() {
        tracing::warn!(status = response.status, endpoint, "key set fetch rejected");
        return Err(AuthError::unexpected_status(response.status, "fetch keys failed"));
    }

    let keys: PublicKeySet = response
        .json()
        .map_err(|e| AuthError::format(format!("invalid key set: {}", e)))?;

    tracing::debug!(endpoint, keys = keys.len(), "fetched key set");
    Ok(keys)
}

/// Supplier of the key set used to verify a token
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn key_set(&self) -> Result<PublicKeySet>;
}

/// Key source that fetches the remote document on every call
pub struct RemoteKeySet {
    endpoint: String,
    proxy_url: Option<String>,
    http: Arc<dyn HttpClient>,
}

impl RemoteKeySet {
    pub fn new(endpoint: impl Into<String>, proxy_url: Option<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            endpoint: endpoint.into(),
            proxy_url,
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl KeySource for RemoteKeySet {
    async fn key_set(&self) -> Result<PublicKeySet> {
        fetch_key_set(&self.endpoint, self.proxy_url.as_deref(), self.http.as_ref()).await
    }
}
