//! Identity provider facades
//!
//! Each provider maps the shared verification and exchange machinery onto its
//! own endpoints and payload shapes.

mod apple;
mod line;
mod unsupported;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuthError, Result};

pub use apple::{AppleClaims, AppleProvider, TokenTypeHint, APPLE_BASE_ENDPOINT, APPLE_ISSUER};
pub use line::{
    LineAccessToken, LineAccessTokenVerification, LineIdToken, LineProvider, LineUserInformation,
    LineUserProfile, LINE_BASE_ENDPOINT,
};
pub use unsupported::UnsupportedProvider;

/// Supported third-party login providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Google,
    Apple,
    Facebook,
    Line,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Apple => "Apple",
            Self::Facebook => "Facebook",
            Self::Line => "Line",
        }
    }

    /// Prefix for this provider's environment variables
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Google => "GOOGLE",
            Self::Apple => "APPLE",
            Self::Facebook => "FACEBOOK",
            Self::Line => "LINE",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "apple" => Ok(Self::Apple),
            "facebook" => Ok(Self::Facebook),
            "line" => Ok(Self::Line),
            other => Err(AuthError::invalid_input(format!("unknown provider '{}'", other))),
        }
    }
}

/// Client registration with a provider
#[derive(Debug, Clone)]
pub struct Service {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: Option<String>,
    pub proxy_url: Option<String>,
    pub kind: ProviderKind,
}

impl Service {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: None,
            proxy_url: None,
            kind,
        }
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Route every call made for this service through `url`
    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }
}

/// Common entry points every provider exposes
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Claims produced by a successful identity token verification
    type Claims: Send;

    /// Result of an authorization code exchange
    type Exchange: Send;

    fn kind(&self) -> ProviderKind;

    async fn verify_identity_token(&self, token: &str) -> Result<Self::Claims>;

    async fn exchange_code(&self, code: &str) -> Result<Self::Exchange>;
}

/// Object-safe view of an [`IdentityProvider`] with JSON results
///
/// Lets callers keep providers of different kinds behind one
/// `Box<dyn DynIdentityProvider>` and pick one at runtime. Every
/// `IdentityProvider` with serializable results implements it.
#[async_trait]
pub trait DynIdentityProvider: Send + Sync {
    fn provider_kind(&self) -> ProviderKind;

    async fn verify_identity_token_value(&self, token: &str) -> Result<Value>;

    async fn exchange_code_value(&self, code: &str) -> Result<Value>;
}

#[async_trait]
impl<P> DynIdentityProvider for P
where
    P: IdentityProvider,
    P::Claims: Serialize,
    P::Exchange: Serialize,
{
    fn provider_kind(&self) -> ProviderKind {
        self.kind()
    }

    async fn verify_identity_token_value(&self, token: &str) -> Result<Value> {
        let claims = self.verify_identity_token(token).await?;
        to_value(&claims)
    }

    async fn exchange_code_value(&self, code: &str) -> Result<Value> {
        let exchange = self.exchange_code(code).await?;
        to_value(&exchange)
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| AuthError::format(format!("failed to encode result: {}", e)))
}
