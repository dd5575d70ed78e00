//! Providers without an implementation (Google, Facebook)

use async_trait::async_trait;

use super::{IdentityProvider, ProviderKind};
use crate::error::{AuthError, Result};

/// Reports `NotImplemented` for every operation
pub struct UnsupportedProvider {
    kind: ProviderKind,
}

impl UnsupportedProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind }
    }

    pub fn google() -> Self {
        Self::new(ProviderKind::Google)
    }

    pub fn facebook() -> Self {
        Self::new(ProviderKind::Facebook)
    }
}

#[async_trait]
impl IdentityProvider for UnsupportedProvider {
    type Claims = serde_json::Value;
    type Exchange = serde_json::Value;

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn verify_identity_token(&self, _token: &str) -> Result<serde_json::Value> {
        Err(AuthError::not_implemented(self.kind))
    }

    async fn exchange_code(&self, _code: &str) -> Result<serde_json::Value> {
        Err(AuthError::not_implemented(self.kind))
    }
}
