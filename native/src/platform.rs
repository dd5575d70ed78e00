//! Native platform implementations
//!
//! Implements core platform traits using native Rust libraries:
//! - HttpClient: reqwest (rustls), per-request timeout and proxy
//! - Clock: std::time::SystemTime
//! - Environment: std::env

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use idtoken_core::error::{AuthError, Result};
use idtoken_core::platform::{Clock, Environment, HttpClient, HttpResponse};
use idtoken_core::request::{Method, PreparedRequest};

/// reqwest-based HTTP client
///
/// Direct requests share one connection pool. The pool holds idle
/// connections only: method, URL, headers, body and timeout are set on each
/// request, so no state carries over from one call to the next. A proxy is a
/// client-level setting in reqwest, so proxied requests get a client of
/// their own.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn client_for(&self, request: &PreparedRequest) -> Result<reqwest::Client> {
        let Some(proxy_url) = request.proxy_url.as_deref() else {
            return Ok(self.client.clone());
        };

        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| AuthError::invalid_input(format!("invalid proxy url: {}", e)))?;

        reqwest::Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| AuthError::network(format!("failed to build proxied client: {}", e)))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &PreparedRequest) -> Result<HttpResponse> {
        let client = self.client_for(request)?;

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = client
            .request(method, request.url.as_str())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!(
                method = request.method.as_str(),
                url = %request.redacted_url(),
                timeout = e.is_timeout(),
                error = %e,
                "outbound request failed"
            );
            transport_error(request.method, e)
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(request.method, e))?
            .to_vec();

        tracing::debug!(url = %request.redacted_url(), status, bytes = body.len(), "outbound request completed");

        Ok(HttpResponse { status, body })
    }
}

/// The request URL is stripped from the message; it may carry a token.
fn transport_error(method: Method, e: reqwest::Error) -> AuthError {
    let e = e.without_url();
    if e.is_timeout() {
        AuthError::network(format!("HTTP {} timed out: {}", method.as_str(), e))
    } else {
        AuthError::network(format!("HTTP {} failed: {}", method.as_str(), e))
    }
}

/// System clock using std::time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// Process environment
///
/// Secrets are expected to be injected as environment variables by the
/// deployment.
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| AuthError::config(format!("environment variable '{}' not set", name)))
    }

    fn get_secret(&self, name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| AuthError::config(format!("secret '{}' not found in environment", name)))
    }
}
