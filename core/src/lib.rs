//! idtoken-core: Platform-agnostic identity token verification
//!
//! Verifies RS256-family identity tokens issued by third-party login providers
//! against their published key sets, and performs the outbound calls those
//! providers require (key fetches, code exchange, revocation). It depends only
//! on abstract platform traits (HttpClient, Clock, Environment) and never
//! imports platform-specific code.

pub mod config;
pub mod error;
pub mod exchange;
pub mod oidc;
pub mod platform;
pub mod provider;
pub mod request;

#[cfg(test)]
pub mod test_support;

pub use error::{AuthError, Result};
pub use oidc::{verify_id_token, IdTokenVerifier, KeySource, PublicKey, PublicKeySet};
pub use platform::{Clock, Environment, HttpClient, HttpResponse};
pub use provider::{DynIdentityProvider, IdentityProvider, ProviderKind, Service};
pub use request::{ContentType, Method, OutboundRequest, PreparedRequest};
