//! Compact token codec
//!
//! Splits `header.payload.signature` tokens and decodes their base64url
//! segments.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AuthError, Result, Segment};

/// Borrowed view over the three encoded segments of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactToken<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

/// Signed token header
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    #[serde(rename = "alg", default)]
    pub algorithm: String,

    #[serde(rename = "kid", default)]
    pub key_id: String,
}

impl<'a> CompactToken<'a> {
    /// Split a token on `.`; anything other than three parts is a format error
    pub fn split(token: &'a str) -> Result<Self> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) => Ok(Self {
                header,
                payload,
                signature,
            }),
            _ => Err(AuthError::format("invalid token format: expected 3 segments")),
        }
    }

    /// The exact text the signature covers: encoded header, `.`, encoded payload
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    pub fn decode_header(&self) -> Result<TokenHeader> {
        let bytes = decode_segment(self.header, Segment::Header)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::format(format!("invalid token header: {}", e)))
    }

    /// Decode the payload as a JSON object into the caller's claims type
    pub fn decode_claims<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = decode_segment(self.payload, Segment::Payload)?;
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::format(format!("invalid token claims: {}", e)))?;
        serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| AuthError::format(format!("invalid token claims: {}", e)))
    }

    pub fn decode_signature(&self) -> Result<Vec<u8>> {
        decode_segment(self.signature, Segment::Signature)
    }
}

/// Raw (unpadded) base64url decode of one token segment
pub fn decode_segment(segment: &str, role: Segment) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::decode(role, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &str) -> String {
        URL_SAFE_NO_PAD.encode(value)
    }

    #[test]
    fn test_split_three_segments() {
        let token = CompactToken::split("aaa.bbb.ccc").unwrap();
        assert_eq!(token.header, "aaa");
        assert_eq!(token.payload, "bbb");
        assert_eq!(token.signature, "ccc");
        assert_eq!(token.signing_input(), "aaa.bbb");
    }

    #[test]
    fn test_split_wrong_segment_count() {
        for input in ["aaa.bbb", "aaa", "a.b.c.d", ""] {
            let err = CompactToken::split(input).unwrap_err();
            assert!(matches!(err, AuthError::Format { .. }), "input: {:?}", input);
        }
    }

    #[test]
    fn test_decode_header() {
        let header = encode(r#"{"kid":"W6WcOKB","alg":"RS256"}"#);
        let input = format!("{}.e30.sig", header);
        let token = CompactToken::split(&input).unwrap();

        let decoded = token.decode_header().unwrap();
        assert_eq!(decoded.algorithm, "RS256");
        assert_eq!(decoded.key_id, "W6WcOKB");
    }

    #[test]
    fn test_decode_rejects_padding() {
        let err = decode_segment("e30=", Segment::Payload).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Decode {
                segment: Segment::Payload,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        let err = decode_segment("ab+/", Segment::Signature).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Decode {
                segment: Segment::Signature,
                ..
            }
        ));
    }

    #[test]
    fn test_header_with_bad_json_is_format_error() {
        let input = format!("{}.e30.sig", encode("not json"));
        let token = CompactToken::split(&input).unwrap();
        assert!(matches!(
            token.decode_header().unwrap_err(),
            AuthError::Format { .. }
        ));
    }

    #[test]
    fn test_claims_must_be_an_object() {
        let input = format!("e30.{}.sig", encode("[1,2,3]"));
        let token = CompactToken::split(&input).unwrap();
        let err = token.decode_claims::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, AuthError::Format { .. }));
    }

    #[test]
    fn test_claims_decode_into_value() {
        let input = format!("e30.{}.sig", encode(r#"{"sub":"001597","exp":1698996183}"#));
        let token = CompactToken::split(&input).unwrap();
        let claims: serde_json::Value = token.decode_claims().unwrap();
        assert_eq!(claims["sub"], "001597");
        assert_eq!(claims["exp"], 1698996183);
    }
}
