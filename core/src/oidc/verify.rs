//! Identity token verification
//!
//! Runs the fixed pipeline: empty check, split, header decode, key fetch,
//! key selection and signature check, payload decode. Any stage error ends
//! the run and nothing decoded so far is returned.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::claims::{ClaimsPolicy, RegisteredClaims};
use super::jwks::KeySource;
use super::signature::verify_with_header;
use super::token::CompactToken;
use crate::error::{AuthError, Result};
use crate::platform::Clock;

/// Verify a token's signature and decode its claims
///
/// No issuer, audience or expiry checks are made; see [`IdTokenVerifier`] for
/// the opt-in variant.
pub async fn verify_id_token<C: DeserializeOwned>(token: &str, keys: &dyn KeySource) -> Result<C> {
    if token.trim().is_empty() {
        return Err(AuthError::invalid_input("invalid id token: empty"));
    }

    let parts = CompactToken::split(token)?;
    let header = parts.decode_header()?;
    let key_set = keys.key_set().await?;
    verify_with_header(&parts, &header, &key_set)?;
    parts.decode_claims()
}

/// Verifier bound to a key source, with an optional claims policy
pub struct IdTokenVerifier {
    keys: Arc<dyn KeySource>,
    policy: Option<(ClaimsPolicy, Arc<dyn Clock>)>,
}

impl IdTokenVerifier {
    pub fn new(keys: Arc<dyn KeySource>) -> Self {
        Self { keys, policy: None }
    }

    /// Also enforce `policy` on every verified token, evaluated at `clock`
    pub fn with_policy(mut self, policy: ClaimsPolicy, clock: Arc<dyn Clock>) -> Self {
        self.policy = Some((policy, clock));
        self
    }

    pub async fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C> {
        let result = self.verify_inner(token).await;
        if let Err(err) = &result {
            tracing::debug!(error = err.error_key(), "identity token rejected");
        }
        result
    }

    async fn verify_inner<C: DeserializeOwned>(&self, token: &str) -> Result<C> {
        let claims = verify_id_token(token, self.keys.as_ref()).await?;

        if let Some((policy, clock)) = &self.policy {
            let registered: RegisteredClaims = CompactToken::split(token)?.decode_claims()?;
            policy.check(&registered, clock.now_secs())?;
        }

        Ok(claims)
    }
}
