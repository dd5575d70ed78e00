//! LINE Login v2.1
//!
//! LINE verifies its own tokens, so every operation here is a call to one of
//! the LINE Login endpoints.
//!
//! Reference: https://developers.line.biz/en/reference/line-login/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{IdentityProvider, ProviderKind, Service};
use crate::config::PROVIDER_REQUEST_TIMEOUT_SECS;
use crate::error::{AuthError, Result};
use crate::exchange;
use crate::platform::{HttpClient, HttpResponse};
use crate::request::{ContentType, Method, OutboundRequest};

pub const LINE_BASE_ENDPOINT: &str = "https://api.line.me";

/// Issued access token (code exchange and refresh)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAccessToken {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Result of verifying an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAccessTokenVerification {
    pub scope: String,
    pub client_id: String,
    pub expires_in: i64,
}

/// Payload of a LINE ID token as returned by the verify endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIdToken {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub amr: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineUserInformation {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineUserProfile {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

#[derive(Deserialize)]
struct FriendshipStatus {
    #[serde(rename = "friendFlag")]
    friend_flag: bool,
}

pub struct LineProvider {
    service: Service,
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl LineProvider {
    pub fn new(service: Service, http: Arc<dyn HttpClient>) -> Self {
        Self {
            service,
            http,
            base_url: LINE_BASE_ENDPOINT.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check that an access token is valid and report its scope and lifetime
    pub async fn verify_access_token(&self, access_token: &str) -> Result<LineAccessTokenVerification> {
        require(access_token, "invalid access token: empty")?;

        let mut url = url::Url::parse(&self.endpoint("/oauth2/v2.1/verify"))
            .map_err(|e| AuthError::invalid_input(format!("invalid verify url: {}", e)))?;
        url.query_pairs_mut().append_pair("access_token", access_token);

        let response = self.request(url.as_str(), Method::Get).send(self.http.as_ref()).await?;
        decode(response, "verify access token failed")
    }

    /// Obtain a new access token with a refresh token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<LineAccessToken> {
        require(refresh_token, "invalid refresh token: empty")?;

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.service.client_id.as_str()),
            ("client_secret", self.service.client_secret.as_str()),
        ];
        let response = self
            .request(&self.endpoint("/oauth2/v2.1/token"), Method::Post)
            .with_content_type(ContentType::WwwForm)
            .with_data(form)
            .send(self.http.as_ref())
            .await?;
        decode(response, "refresh access token failed")
    }

    /// Invalidate an access token
    pub async fn revoke_access_token(&self, access_token: &str) -> Result<()> {
        require(access_token, "invalid access token: empty")?;

        let form = [
            ("access_token", access_token),
            ("client_id", self.service.client_id.as_str()),
            ("client_secret", self.service.client_secret.as_str()),
        ];
        let response = self
            .request(&self.endpoint("/oauth2/v2.1/revoke"), Method::Post)
            .with_content_type(ContentType::WwwForm)
            .with_data(form)
            .send(self.http.as_ref())
            .await?;
        ensure_ok(&response, "revoke access token failed")
    }

    /// Have LINE verify an ID token and return its payload
    pub async fn verify_id_token(&self, id_token: &str) -> Result<LineIdToken> {
        require(id_token, "invalid id token: empty")?;

        let form = [
            ("id_token", id_token),
            ("client_id", self.service.client_id.as_str()),
        ];
        let response = self
            .request(&self.endpoint("/oauth2/v2.1/verify"), Method::Post)
            .with_content_type(ContentType::WwwForm)
            .with_data(form)
            .send(self.http.as_ref())
            .await?;
        decode(response, "verify id token failed")
    }

    /// User id, display name and picture (requires the `openid` scope)
    pub async fn user_information(&self, access_token: &str) -> Result<LineUserInformation> {
        self.bearer_get("/oauth2/v2.1/userinfo", access_token, "user information failed")
            .await
    }

    /// User id, display name, picture and status message (requires the `profile` scope)
    pub async fn user_profile(&self, access_token: &str) -> Result<LineUserProfile> {
        self.bearer_get("/v2/profile", access_token, "user profile failed")
            .await
    }

    /// Whether the user has added the linked LINE Official Account as a friend
    pub async fn friendship_status(&self, access_token: &str) -> Result<bool> {
        let status: FriendshipStatus = self
            .bearer_get("/friendship/v1/status", access_token, "friendship status failed")
            .await?;
        Ok(status.friend_flag)
    }

    async fn bearer_get<T: DeserializeOwned>(&self, path: &str, access_token: &str, context: &str) -> Result<T> {
        require(access_token, "invalid access token: empty")?;

        let response = self
            .request(&self.endpoint(path), Method::Get)
            .with_header("Authorization", format!("Bearer {}", access_token))
            .send(self.http.as_ref())
            .await?;
        decode(response, context)
    }

    fn request(&self, url: &str, method: Method) -> OutboundRequest {
        OutboundRequest::new(url, method, self.service.proxy_url.as_deref())
            .with_timeout(Duration::from_secs(PROVIDER_REQUEST_TIMEOUT_SECS))
    }
}

#[async_trait]
impl IdentityProvider for LineProvider {
    type Claims = LineIdToken;
    type Exchange = LineAccessToken;

    fn kind(&self) -> ProviderKind {
        ProviderKind::Line
    }

    async fn verify_identity_token(&self, token: &str) -> Result<LineIdToken> {
        self.verify_id_token(token).await
    }

    async fn exchange_code(&self, code: &str) -> Result<LineAccessToken> {
        let response = exchange::post_authorization_code(
            &self.endpoint("/oauth2/v2.1/token"),
            &self.service,
            code,
            self.http.as_ref(),
        )
        .await?;
        decode(response, "code exchange failed")
    }
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AuthError::invalid_input(message));
    }
    Ok(())
}

fn ensure_ok(response: &HttpResponse, context: &str) -> Result<()> {
    if !response.is_ok() {
        tracing::debug!(status = response.status, context, "LINE request rejected");
        return Err(AuthError::unexpected_status(response.status, context));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(response: HttpResponse, context: &str) -> Result<T> {
    ensure_ok(&response, context)?;
    response
        .json()
        .map_err(|e| AuthError::format(format!("{}: invalid response: {}", context, e)))
}
