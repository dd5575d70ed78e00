//! Token signature verification
//!
//! Selects the published key named by the token header and checks the RSA
//! PKCS#1 v1.5 signature over `header.payload`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rsa::{BigUint, Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use super::jwks::{PublicKey, PublicKeySet};
use super::token::{CompactToken, TokenHeader};
use crate::error::{AuthError, Result};

/// Verify a token against a key set, decoding the header first
pub fn verify_signature(token: &CompactToken<'_>, keys: &PublicKeySet) -> Result<()> {
    let header = token.decode_header()?;
    verify_with_header(token, &header, keys)
}

/// Verify a token whose header has already been decoded
pub fn verify_with_header(
    token: &CompactToken<'_>,
    header: &TokenHeader,
    keys: &PublicKeySet,
) -> Result<()> {
    let key = keys
        .find(&header.algorithm, &header.key_id)
        .ok_or(AuthError::KeyNotFound)?;

    let (scheme, hashed) = digest(&key.algorithm, token.signing_input().as_bytes())?;
    let public_key = rsa_public_key(key)?;
    let signature = token.decode_signature()?;

    public_key
        .verify(scheme, &hashed, &signature)
        .map_err(|e| AuthError::signature(format!("verification failed: {}", e)))
}

/// Hash the signing input with the digest the algorithm implies
fn digest(algorithm: &str, input: &[u8]) -> Result<(Pkcs1v15Sign, Vec<u8>)> {
    match algorithm {
        "RS256" => Ok((Pkcs1v15Sign::new::<Sha256>(), Sha256::digest(input).to_vec())),
        "RS384" => Ok((Pkcs1v15Sign::new::<Sha384>(), Sha384::digest(input).to_vec())),
        "RS512" => Ok((Pkcs1v15Sign::new::<Sha512>(), Sha512::digest(input).to_vec())),
        other => Err(AuthError::signature(format!(
            "unsupported algorithm '{}'",
            other
        ))),
    }
}

/// Rebuild an RSA public key from its base64url modulus and exponent
fn rsa_public_key(key: &PublicKey) -> Result<RsaPublicKey> {
    if !key.key_type.is_empty() && key.key_type != "RSA" {
        return Err(AuthError::signature(format!(
            "unsupported key type '{}'",
            key.key_type
        )));
    }

    let n = URL_SAFE_NO_PAD
        .decode(&key.modulus)
        .map_err(|e| AuthError::signature(format!("invalid key modulus: {}", e)))?;
    let e = URL_SAFE_NO_PAD
        .decode(&key.exponent)
        .map_err(|e| AuthError::signature(format!("invalid key exponent: {}", e)))?;

    RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
        .map_err(|e| AuthError::signature(format!("invalid key material: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mint_token, test_key_set, test_public_key, TEST_KID};
    use serde_json::json;

    fn claims() -> serde_json::Value {
        json!({"iss": "https://appleid.apple.com", "sub": "001597.3efce279", "exp": 1698996183})
    }

    #[test]
    fn test_valid_signature() {
        let token = mint_token(TEST_KID, &claims());
        let parts = CompactToken::split(&token).unwrap();

        verify_signature(&parts, &test_key_set()).unwrap();
    }

    #[test]
    fn test_first_matching_key_is_used() {
        let token = mint_token(TEST_KID, &claims());
        let parts = CompactToken::split(&token).unwrap();

        let mut unrelated = test_public_key("unrelated");
        unrelated.modulus = "AQAB".to_string();
        let keys = PublicKeySet {
            keys: vec![unrelated.clone(), test_public_key(TEST_KID)],
        };
        verify_signature(&parts, &keys).unwrap();

        let mut shadowing = unrelated;
        shadowing.key_id = TEST_KID.to_string();
        let keys = PublicKeySet {
            keys: vec![shadowing, test_public_key(TEST_KID)],
        };
        let err = verify_signature(&parts, &keys).unwrap_err();
        assert!(matches!(err, AuthError::Signature { .. }));
    }

    #[test]
    fn test_unknown_kid_is_key_not_found() {
        let token = mint_token("rotated-away", &claims());
        let parts = CompactToken::split(&token).unwrap();

        let err = verify_signature(&parts, &test_key_set()).unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound));
    }

    #[test]
    fn test_algorithm_mismatch_is_key_not_found() {
        let token = mint_token(TEST_KID, &claims());
        let parts = CompactToken::split(&token).unwrap();

        let mut key = test_public_key(TEST_KID);
        key.algorithm = "RS512".to_string();
        let keys = PublicKeySet { keys: vec![key] };

        let err = verify_signature(&parts, &keys).unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound));
    }

    #[test]
    fn test_flipped_signature_bit_fails() {
        let token = mint_token(TEST_KID, &claims());
        let parts = CompactToken::split(&token).unwrap();

        let mut signature = parts.decode_signature().unwrap();
        signature[10] ^= 0x01;
        let tampered_sig = URL_SAFE_NO_PAD.encode(signature);
        let tampered = CompactToken {
            signature: &tampered_sig,
            ..parts
        };

        let err = verify_signature(&tampered, &test_key_set()).unwrap_err();
        assert!(matches!(err, AuthError::Signature { .. }));
    }

    #[test]
    fn test_modified_payload_fails() {
        let token = mint_token(TEST_KID, &claims());
        let parts = CompactToken::split(&token).unwrap();

        let forged_payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"someone-else"}"#);
        let forged = CompactToken {
            payload: &forged_payload,
            ..parts
        };

        let err = verify_signature(&forged, &test_key_set()).unwrap_err();
        assert!(matches!(err, AuthError::Signature { .. }));
    }

    #[test]
    fn test_malformed_key_material_is_signature_error() {
        let token = mint_token(TEST_KID, &claims());
        let parts = CompactToken::split(&token).unwrap();

        let mut key = test_public_key(TEST_KID);
        key.modulus = "not base64!".to_string();
        let keys = PublicKeySet { keys: vec![key] };

        let err = verify_signature(&parts, &keys).unwrap_err();
        assert!(matches!(err, AuthError::Signature { .. }));
    }

    #[test]
    fn test_unsupported_algorithm_is_signature_error() {
        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"HS256","kid":"{}"}}"#, TEST_KID));
        let input = format!("{}.e30.c2ln", header);
        let parts = CompactToken::split(&input).unwrap();

        let mut key = test_public_key(TEST_KID);
        key.algorithm = "HS256".to_string();
        let keys = PublicKeySet { keys: vec![key] };

        let err = verify_signature(&parts, &keys).unwrap_err();
        assert!(matches!(err, AuthError::Signature { .. }));
    }
}
