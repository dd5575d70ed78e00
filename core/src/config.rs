//! Provider configuration and request defaults

use crate::error::{AuthError, Result};
use crate::platform::Environment;
use crate::provider::{ProviderKind, Service};

/// Timeout applied when a request does not set one
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Timeout for every provider call (key fetch, exchange, refresh, revoke, profile)
pub const PROVIDER_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default lifetime of a cached key set
pub const KEY_SET_CACHE_TTL_SECS: u64 = 3600;

/// Proxy shared by all providers
pub const PROXY_URL_VAR: &str = "IDP_PROXY_URL";

/// Provider credentials loaded from the environment
///
/// Variables are prefixed with the upper-cased provider name, e.g.
/// `APPLE_CLIENT_ID`, `APPLE_CLIENT_SECRET`, `APPLE_REDIRECT_URL`.
/// `<KIND>_BASE_URL` overrides the provider's public endpoint.
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: Option<String>,
    pub proxy_url: Option<String>,
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Load configuration for one provider from platform environment
    pub fn from_env(env: &dyn Environment, kind: ProviderKind) -> Result<Self> {
        let prefix = kind.env_prefix();
        let client_id_var = format!("{}_CLIENT_ID", prefix);
        let client_secret_var = format!("{}_CLIENT_SECRET", prefix);

        Ok(Self {
            kind,
            client_id: env
                .get_var(&client_id_var)
                .map_err(|_| AuthError::config(format!("{} not configured", client_id_var)))?,
            client_secret: env
                .get_secret(&client_secret_var)
                .map_err(|_| AuthError::config(format!("{} secret not set", client_secret_var)))?,
            redirect_url: optional_var(env, &format!("{}_REDIRECT_URL", prefix)),
            proxy_url: optional_var(env, PROXY_URL_VAR),
            base_url: optional_var(env, &format!("{}_BASE_URL", prefix)),
        })
    }

    pub fn into_service(self) -> Service {
        let mut service = Service::new(self.client_id, self.client_secret, self.kind);
        if let Some(url) = self.redirect_url {
            service = service.with_redirect_url(url);
        }
        if let Some(url) = self.proxy_url {
            service = service.with_proxy_url(url);
        }
        service
    }
}

fn optional_var(env: &dyn Environment, name: &str) -> Option<String> {
    env.get_var(name).ok().filter(|v| !v.trim().is_empty())
}
