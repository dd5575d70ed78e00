//! Error types for token verification and provider calls

use std::fmt;

use thiserror::Error;

/// Result type alias for verification and provider operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Which part of a compact token failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Header,
    Payload,
    Signature,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Payload => "payload",
            Self::Signature => "signature",
        })
    }
}

/// Verification and exchange error
#[derive(Error, Debug)]
pub enum AuthError {
    /// Caller passed an empty token, code or other required input
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Malformed compact token or JSON document
    #[error("invalid format: {message}")]
    Format { message: String },

    /// Invalid base64url in one of the token segments
    #[error("failed to decode token {segment}: {message}")]
    Decode { segment: Segment, message: String },

    /// Transport failure (`status` is `None`) or unexpected HTTP status
    #[error("network error: {message}")]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// No key in the set matches the token header
    #[error("no matching key for token")]
    KeyNotFound,

    #[error("invalid signature: {message}")]
    Signature { message: String },

    /// Claims failed an explicitly requested policy check
    #[error("invalid claims: {message}")]
    InvalidClaims { message: String },

    #[error("not implemented for provider {provider}")]
    NotImplemented { provider: String },

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl AuthError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub fn decode(segment: Segment, message: impl Into<String>) -> Self {
        Self::Decode {
            segment,
            message: message.into(),
        }
    }

    /// Transport-level failure where no response was received
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    /// Response received with a status the caller does not accept
    pub fn unexpected_status(status: u16, context: &str) -> Self {
        Self::Network {
            status: Some(status),
            message: format!("{}: HTTP {}", context, status),
        }
    }

    pub fn signature(message: impl Into<String>) -> Self {
        Self::Signature {
            message: message.into(),
        }
    }

    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    pub fn not_implemented(provider: impl fmt::Display) -> Self {
        Self::NotImplemented {
            provider: provider.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Upstream HTTP status, if the error came from a received response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::Format { .. } => "invalid_format",
            Self::Decode { .. } => "decode_error",
            Self::Network { .. } => "network_error",
            Self::KeyNotFound => "key_not_found",
            Self::Signature { .. } => "invalid_signature",
            Self::InvalidClaims { .. } => "invalid_claims",
            Self::NotImplemented { .. } => "not_implemented",
            Self::Config { .. } => "config_error",
        }
    }
}
