//! Identity token module
//!
//! Handles identity token verification: compact token decoding, key set
//! fetching and caching, signature checks and optional claim checks.

mod cache;
mod claims;
mod jwks;
mod signature;
mod token;
mod verify;

pub use cache::CachedKeySet;
pub use claims::{ClaimsPolicy, RegisteredClaims, DEFAULT_LEEWAY_SECS};
pub use jwks::{fetch_key_set, KeySource, PublicKey, PublicKeySet, RemoteKeySet};
pub use signature::verify_signature;
pub use token::{decode_segment, CompactToken, TokenHeader};
pub use verify::{verify_id_token, IdTokenVerifier};
