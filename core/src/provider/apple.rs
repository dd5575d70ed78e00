//! Sign in with Apple
//!
//! Identity tokens are verified locally against Apple's published keys;
//! codes and tokens are exchanged and revoked over Apple's REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{IdentityProvider, ProviderKind, Service};
use crate::config::PROVIDER_REQUEST_TIMEOUT_SECS;
use crate::error::{AuthError, Result};
use crate::exchange;
use crate::oidc::{fetch_key_set, ClaimsPolicy, IdTokenVerifier, KeySource, PublicKeySet, RemoteKeySet};
use crate::platform::{Clock, HttpClient};
use crate::request::{ContentType, Method, OutboundRequest};

pub const APPLE_BASE_ENDPOINT: &str = "https://appleid.apple.com";

/// `iss` of every Apple identity token
pub const APPLE_ISSUER: &str = "https://appleid.apple.com";

/// Claims in an Apple identity token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppleClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: u64,
    pub iat: u64,

    /// Time the user authenticated
    #[serde(default)]
    pub auth_time: Option<u64>,

    #[serde(default)]
    pub c_hash: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Apple sends this as either `"true"` or `true`
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub email_verified: bool,

    #[serde(default)]
    pub nonce_supported: bool,
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("boolean or \"true\"/\"false\"")
        }

        fn visit_bool<E>(self, value: bool) -> std::result::Result<bool, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<bool, E>
        where
            E: de::Error,
        {
            match value {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// Kind of token passed to [`AppleProvider::revoke_token`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

impl TokenTypeHint {
    fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

pub struct AppleProvider {
    service: Service,
    http: Arc<dyn HttpClient>,
    base_url: String,
    keys: Option<Arc<dyn KeySource>>,
    policy: Option<(ClaimsPolicy, Arc<dyn Clock>)>,
}

impl AppleProvider {
    /// Keys are refetched from Apple on every verification unless a key
    /// source is supplied with [`AppleProvider::with_key_source`].
    pub fn new(service: Service, http: Arc<dyn HttpClient>) -> Self {
        Self {
            service,
            http,
            base_url: APPLE_BASE_ENDPOINT.to_string(),
            keys: None,
            policy: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use `keys` (for example a `CachedKeySet`) instead of fetching per call
    pub fn with_key_source(mut self, keys: Arc<dyn KeySource>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Require Apple's issuer, this client as audience and an unexpired token
    pub fn with_claims_validation(mut self, clock: Arc<dyn Clock>) -> Self {
        let policy = ClaimsPolicy::new()
            .issuer(APPLE_ISSUER)
            .audience(self.service.client_id.clone());
        self.policy = Some((policy, clock));
        self
    }

    pub fn keys_url(&self) -> String {
        format!("{}/auth/keys", self.base_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/auth/token", self.base_url)
    }

    pub fn revoke_url(&self) -> String {
        format!("{}/auth/revoke", self.base_url)
    }

    /// Key source that fetches Apple's key set on every call
    pub fn remote_key_source(&self) -> RemoteKeySet {
        RemoteKeySet::new(self.keys_url(), self.service.proxy_url.clone(), self.http.clone())
    }

    pub async fn fetch_key_set(&self) -> Result<PublicKeySet> {
        fetch_key_set(&self.keys_url(), self.service.proxy_url.as_deref(), self.http.as_ref()).await
    }

    /// Invalidate an access or refresh token
    pub async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> Result<()> {
        if token.trim().is_empty() {
            return Err(AuthError::invalid_input("invalid token: empty"));
        }

        let form = [
            ("client_id", self.service.client_id.as_str()),
            ("client_secret", self.service.client_secret.as_str()),
            ("token", token),
            ("token_type_hint", hint.as_str()),
        ];
        let response = OutboundRequest::new(self.revoke_url(), Method::Post, self.service.proxy_url.as_deref())
            .with_timeout(Duration::from_secs(PROVIDER_REQUEST_TIMEOUT_SECS))
            .with_content_type(ContentType::WwwForm)
            .with_data(form)
            .send(self.http.as_ref())
            .await?;

        if !response.is_ok() {
            return Err(AuthError::unexpected_status(response.status, "revoke token failed"));
        }
        Ok(())
    }

    fn verifier(&self) -> IdTokenVerifier {
        let keys = match &self.keys {
            Some(keys) => keys.clone(),
            None => Arc::new(self.remote_key_source()),
        };
        let verifier = IdTokenVerifier::new(keys);
        match &self.policy {
            Some((policy, clock)) => verifier.with_policy(policy.clone(), clock.clone()),
            None => verifier,
        }
    }
}

#[async_trait]
impl IdentityProvider for AppleProvider {
    type Claims = AppleClaims;
    type Exchange = i64;

    fn kind(&self) -> ProviderKind {
        ProviderKind::Apple
    }

    async fn verify_identity_token(&self, token: &str) -> Result<AppleClaims> {
        self.verifier().verify(token).await
    }

    /// Returns the integer `code` of Apple's token endpoint reply
    async fn exchange_code(&self, code: &str) -> Result<i64> {
        exchange::exchange_code(&self.token_url(), &self.service, code, self.http.as_ref()).await
    }
}
