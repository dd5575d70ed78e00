//! idtoken-native: tokio + reqwest bindings for idtoken-core
//!
//! Supplies the concrete HTTP client, clock and environment, plus
//! constructors that wire configured providers from the process environment.

pub mod platform;

use std::sync::Arc;

use idtoken_core::config::ProviderConfig;
use idtoken_core::error::Result;
use idtoken_core::oidc::CachedKeySet;
use idtoken_core::platform::{Clock, Environment, HttpClient};
use idtoken_core::provider::{
    AppleProvider, DynIdentityProvider, LineProvider, ProviderKind, UnsupportedProvider,
};

pub use platform::{ProcessEnv, ReqwestHttpClient, SystemClock};

/// Apple provider configured from `APPLE_*` variables
///
/// Apple's key set is cached for `KEY_SET_CACHE_TTL_SECS` and the standard
/// claims (issuer, audience, expiry) are enforced.
pub fn apple_from_env() -> Result<AppleProvider> {
    apple_from(&ProcessEnv, Arc::new(ReqwestHttpClient::new()), Arc::new(SystemClock))
}

/// LINE provider configured from `LINE_*` variables
pub fn line_from_env() -> Result<LineProvider> {
    line_from(&ProcessEnv, Arc::new(ReqwestHttpClient::new()))
}

/// Provider chosen at runtime, configured from the process environment
pub fn provider_from_env(kind: ProviderKind) -> Result<Box<dyn DynIdentityProvider>> {
    provider_from(kind, &ProcessEnv, Arc::new(ReqwestHttpClient::new()), Arc::new(SystemClock))
}

pub fn provider_from(
    kind: ProviderKind,
    env: &dyn Environment,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
) -> Result<Box<dyn DynIdentityProvider>> {
    Ok(match kind {
        ProviderKind::Apple => Box::new(apple_from(env, http, clock)?),
        ProviderKind::Line => Box::new(line_from(env, http)?),
        ProviderKind::Google | ProviderKind::Facebook => Box::new(UnsupportedProvider::new(kind)),
    })
}

pub fn apple_from(
    env: &dyn Environment,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
) -> Result<AppleProvider> {
    let config = ProviderConfig::from_env(env, ProviderKind::Apple)?;
    let base_url = config.base_url.clone();

    let mut provider = AppleProvider::new(config.into_service(), http);
    if let Some(url) = base_url {
        provider = provider.with_base_url(url);
    }

    let keys = CachedKeySet::new(Arc::new(provider.remote_key_source()), clock.clone());
    tracing::debug!(endpoint = %provider.keys_url(), "configured apple provider");

    Ok(provider
        .with_key_source(Arc::new(keys))
        .with_claims_validation(clock))
}

pub fn line_from(env: &dyn Environment, http: Arc<dyn HttpClient>) -> Result<LineProvider> {
    let config = ProviderConfig::from_env(env, ProviderKind::Line)?;
    let base_url = config.base_url.clone();

    let provider = LineProvider::new(config.into_service(), http);
    Ok(match base_url {
        Some(url) => provider.with_base_url(url),
        None => provider,
    })
}
