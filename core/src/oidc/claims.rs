//! Registered claim checks
//!
//! Verification only proves who signed a token. Callers that also want the
//! issuer, audience and validity window enforced attach a [`ClaimsPolicy`].

use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Default clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// The subset of claims a policy inspects
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisteredClaims {
    #[serde(default)]
    pub iss: String,

    /// Audience (can be string or array)
    #[serde(default, deserialize_with = "deserialize_audience")]
    pub aud: Vec<String>,

    #[serde(default)]
    pub exp: Option<u64>,

    #[serde(default)]
    pub iat: Option<u64>,

    #[serde(default)]
    pub nbf: Option<u64>,
}

/// Deserialize audience as either string or array
fn deserialize_audience<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct AudienceVisitor;

    impl<'de> Visitor<'de> for AudienceVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("string or array of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Vec<String>, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Vec<String>, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element()? {
                values.push(value);
            }
            Ok(values)
        }
    }

    deserializer.deserialize_any(AudienceVisitor)
}

/// Expectations applied to verified claims
#[derive(Debug, Clone)]
pub struct ClaimsPolicy {
    issuer: Option<String>,
    audience: Option<String>,
    leeway_secs: u64,
}

impl Default for ClaimsPolicy {
    fn default() -> Self {
        Self {
            issuer: None,
            audience: None,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }
}

impl ClaimsPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Check claims against this policy at time `now_secs`
    pub fn check(&self, claims: &RegisteredClaims, now_secs: u64) -> Result<()> {
        if let Some(issuer) = &self.issuer {
            if claims.iss.trim_end_matches('/') != issuer.trim_end_matches('/') {
                return Err(AuthError::invalid_claims(format!(
                    "issuer mismatch: expected '{}', got '{}'",
                    issuer, claims.iss
                )));
            }
        }

        if let Some(audience) = &self.audience {
            if !claims.aud.iter().any(|a| a == audience) {
                return Err(AuthError::invalid_claims("audience mismatch"));
            }
        }

        let exp = claims
            .exp
            .ok_or_else(|| AuthError::invalid_claims("token has no expiry (exp claim)"))?;
        if exp.saturating_add(self.leeway_secs) <= now_secs {
            return Err(AuthError::invalid_claims("token has expired"));
        }

        if let Some(nbf) = claims.nbf {
            if nbf > now_secs.saturating_add(self.leeway_secs) {
                return Err(AuthError::invalid_claims("token is not yet valid (nbf claim)"));
            }
        }

        if let Some(iat) = claims.iat {
            if iat > now_secs.saturating_add(self.leeway_secs) {
                return Err(AuthError::invalid_claims("token issued in the future (iat claim)"));
            }
            if iat >= exp {
                return Err(AuthError::invalid_claims("invalid token: iat >= exp"));
            }
        }

        Ok(())
    }
}
