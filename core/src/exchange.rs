//! Authorization code exchange
//!
//! Trades a short-lived authorization code at a provider's token endpoint.

use std::time::Duration;

use serde::Deserialize;

use crate::config::PROVIDER_REQUEST_TIMEOUT_SECS;
use crate::error::{AuthError, Result};
use crate::platform::{HttpClient, HttpResponse};
use crate::provider::Service;
use crate::request::{ContentType, Method, OutboundRequest};

/// Token endpoint reply carrying a numeric result code
#[derive(Debug, Deserialize)]
struct ExchangeResult {
    code: i64,
}

/// Exchange `code` and return the endpoint's integer result code
pub async fn exchange_code(
    token_endpoint: &str,
    service: &Service,
    code: &str,
    http: &dyn HttpClient,
) -> Result<i64> {
    let response = post_authorization_code(token_endpoint, service, code, http).await?;

    let result: ExchangeResult = response
        .json()
        .map_err(|e| AuthError::format(format!("invalid exchange response: {}", e)))?;

    Ok(result.code)
}

/// POST `grant_type=authorization_code` and return the 200 response
pub(crate) async fn post_authorization_code(
    token_endpoint: &str,
    service: &Service,
    code: &str,
    http: &dyn HttpClient,
) -> Result<HttpResponse> {
    if code.trim().is_empty() {
        return Err(AuthError::invalid_input("invalid authorization code: empty"));
    }

    let form = [
        ("client_id", service.client_id.as_str()),
        ("client_secret", service.client_secret.as_str()),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", service.redirect_url.as_deref().unwrap_or_default()),
    ];

    let response = OutboundRequest::new(token_endpoint, Method::Post, service.proxy_url.as_deref())
        .with_timeout(Duration::from_secs(PROVIDER_REQUEST_TIMEOUT_SECS))
        .with_content_type(ContentType::WwwForm)
        .with_data(form)
        .send(http)
        .await?;

    if !response.is_ok() {
        return Err(AuthError::unexpected_status(response.status, "code exchange failed"));
    }

    Ok(response)
}
