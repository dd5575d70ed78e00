//! Outbound request construction
//!
//! Every provider call (key fetch, code exchange, refresh, revoke, profile) is
//! described by an [`OutboundRequest`], resolved into a [`PreparedRequest`]
//! (defaults applied, body encoded) and handed to a [`HttpClient`].

use std::time::Duration;

use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::error::{AuthError, Result};
use crate::platform::{HttpClient, HttpResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Body encoding for request data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    WwwForm,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json;charset=utf-8",
            Self::WwwForm => "application/x-www-form-urlencoded",
        }
    }

    /// Recognize a `Content-Type` header value, ignoring parameters and case
    pub fn from_header(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("application/json") {
            Some(Self::Json)
        } else if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(Self::WwwForm)
        } else {
            None
        }
    }
}

/// Description of a single outbound HTTP request
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    url: String,
    method: Method,
    proxy_url: Option<String>,
    content_type: Option<ContentType>,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
    data: Vec<(String, String)>,
}

impl OutboundRequest {
    /// An empty proxy string means a direct connection.
    pub fn new(url: impl Into<String>, method: Method, proxy_url: Option<&str>) -> Self {
        Self {
            url: url.into(),
            method,
            proxy_url: proxy_url
                .filter(|p| !p.trim().is_empty())
                .map(str::to_string),
            content_type: None,
            timeout: None,
            headers: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// A zero timeout falls back to the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.data
            .extend(data.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Apply defaults, validate and encode the body
    pub fn prepare(&self) -> Result<PreparedRequest> {
        if self.url.trim().is_empty() {
            return Err(AuthError::invalid_input("request url is empty"));
        }
        url::Url::parse(&self.url)
            .map_err(|e| AuthError::invalid_input(format!("invalid request url: {}", e)))?;

        if let Some(proxy) = &self.proxy_url {
            url::Url::parse(proxy)
                .map_err(|e| AuthError::invalid_input(format!("invalid proxy url: {}", e)))?;
        }

        let timeout = match self.timeout {
            Some(t) if !t.is_zero() => t,
            _ => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let mut headers = self.headers.clone();
        let body = match self.resolved_content_type() {
            Some(content_type) if !self.data.is_empty() => {
                if find_header(&headers, "content-type").is_none() {
                    headers.push(("Content-Type".to_string(), content_type.mime().to_string()));
                }
                encode_body(content_type, &self.data)?
            }
            _ => Vec::new(),
        };

        Ok(PreparedRequest {
            url: self.url.clone(),
            method: self.method,
            proxy_url: self.proxy_url.clone(),
            timeout,
            headers,
            body,
        })
    }

    /// Prepare and execute the request exactly once
    pub async fn send(&self, http: &dyn HttpClient) -> Result<HttpResponse> {
        let prepared = self.prepare()?;
        tracing::debug!(
            method = prepared.method.as_str(),
            url = %prepared.redacted_url(),
            timeout_secs = prepared.timeout.as_secs(),
            proxied = prepared.proxy_url.is_some(),
            "sending outbound request"
        );
        http.execute(&prepared).await
    }

    /// Send as GET regardless of the method given at construction
    pub async fn get(mut self, http: &dyn HttpClient) -> Result<HttpResponse> {
        self.method = Method::Get;
        self.send(http).await
    }

    /// Send as POST regardless of the method given at construction
    pub async fn post(mut self, http: &dyn HttpClient) -> Result<HttpResponse> {
        self.method = Method::Post;
        self.send(http).await
    }

    fn resolved_content_type(&self) -> Option<ContentType> {
        self.content_type.or_else(|| {
            find_header(&self.headers, "content-type").and_then(ContentType::from_header)
        })
    }
}

/// Fully resolved request handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub url: String,
    pub method: Method,
    pub proxy_url: Option<String>,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl PreparedRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// URL safe to log: scheme, host, port and path only
    ///
    /// Query strings can carry access tokens and userinfo can carry
    /// credentials; both are dropped along with the fragment.
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }
}

fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Encode key/value data for the given content type
///
/// Repeated keys keep the last value in JSON and every value in form encoding.
fn encode_body(content_type: ContentType, data: &[(String, String)]) -> Result<Vec<u8>> {
    match content_type {
        ContentType::Json => {
            let object: serde_json::Map<String, serde_json::Value> = data
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            serde_json::to_vec(&object)
                .map_err(|e| AuthError::format(format!("failed to encode JSON body: {}", e)))
        }
        ContentType::WwwForm => Ok(url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(data.iter())
            .finish()
            .into_bytes()),
    }
}
