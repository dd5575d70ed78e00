//! Platform abstraction traits
//!
//! These traits define the boundary between the platform-agnostic verification
//! logic and a concrete runtime (tokio + reqwest in `idtoken-native`, mocks in
//! tests).

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::request::PreparedRequest;

/// Transport for outbound requests (key sets, code exchange, profile calls)
///
/// Implementations perform exactly one round trip per call, honor the
/// request's timeout and proxy, and read the whole body before returning.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: &PreparedRequest) -> Result<HttpResponse>;
}

/// HTTP response from an outbound request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Parse body as UTF-8 string
    pub fn text(&self) -> std::result::Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Clock for current time (enables testing with deterministic timestamps)
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

/// Environment/secrets access
pub trait Environment {
    fn get_var(&self, name: &str) -> Result<String>;
    fn get_secret(&self, name: &str) -> Result<String>;
}
