//! Password hashing, password policy, and access token issue/decode.

use crate::errors::ApiError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Symbol class accepted by the password policy.
const PASSWORD_SYMBOLS: &str = "#?!@$%^&*-";

/// Maximum allowed token size in bytes.
///
/// Oversized tokens are rejected before any parsing or cryptographic
/// operations. Typical tokens here are well under 500 bytes.
const MAX_TOKEN_SIZE_BYTES: usize = 4096;

/// Access token claims.
///
/// The `sub` field carries the username, which should not be exposed in
/// logs. A custom Debug implementation redacts it.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (username)
    pub exp: i64,    // Expiration timestamp
    pub iat: i64,    // Issued at timestamp
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish()
    }
}

/// Token decode failure. Absorbed into `ApiError::Unauthorized` at the
/// request boundary; the reason never reaches the caller.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("the access token is invalid or expired")]
    Invalid,
}

/// Hash a password with bcrypt.
///
/// Salted per call: the same plaintext yields different hashes, all of
/// which verify.
pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    bcrypt::hash(password, cost)
        .map_err(|e| ApiError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, hash)
        .map_err(|e| ApiError::Crypto(format!("Password verification failed: {}", e)))
}

/// Check a password against the account password policy.
///
/// At least 8 characters, containing one lowercase letter, one uppercase
/// letter, one digit, and one symbol from `#?!@$%^&*-`. Pure; never fails.
pub fn validate_password_policy(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// Simple email syntax check: local@domain with a dotted, non-empty domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    domain_parts.len() >= 2 && domain_parts.iter().all(|p| !p.is_empty())
}

/// Issue a signed access token for `subject`, expiring after `ttl`.
///
/// HS256 over the process-wide secret; the algorithm is configuration,
/// not caller input.
pub fn issue_access_token(subject: &str, ttl: Duration, secret: &[u8]) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        exp: now + ttl.num_seconds(),
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| ApiError::Crypto(format!("Token signing failed: {}", e)))
}

/// Decode and validate an access token.
///
/// Fails on bad signature, malformed input, or expired `exp`. The size
/// check runs before any parsing.
pub fn decode_access_token(token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(TokenError::Invalid);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            TokenError::Invalid
        })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn test_secret() -> Vec<u8> {
        vec![7u8; 32]
    }

    #[test]
    fn test_password_policy_accepts_conforming_passwords() {
        assert!(validate_password_policy("Aa1$aaaa"));
        assert!(validate_password_policy("C0mplex-Passphrase"));
        assert!(validate_password_policy("xX9#longer-than-needed"));
    }

    #[test]
    fn test_password_policy_rejects_nonconforming_passwords() {
        // Too short
        assert!(!validate_password_policy("Aa1$aaa"));
        // Missing lowercase
        assert!(!validate_password_policy("AA1$AAAA"));
        // Missing uppercase
        assert!(!validate_password_policy("aa1$aaaa"));
        // Missing digit
        assert!(!validate_password_policy("Aaa$aaaa"));
        // Missing symbol
        assert!(!validate_password_policy("Aa1aaaaa"));
        // Symbol outside the fixed set
        assert!(!validate_password_policy("Aa1(aaaa"));
        assert!(!validate_password_policy(""));
    }

    #[test]
    fn test_hash_verify_round_trip() {
        let hash = hash_password("Aa1$aaaa", TEST_COST).expect("hashing should succeed");
        assert!(verify_password("Aa1$aaaa", &hash).expect("verify should succeed"));
        assert!(!verify_password("Bb2$bbbb", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("Aa1$aaaa", TEST_COST).expect("hashing should succeed");
        let second = hash_password("Aa1$aaaa", TEST_COST).expect("hashing should succeed");
        assert_ne!(first, second);
        assert!(verify_password("Aa1$aaaa", &first).expect("verify should succeed"));
        assert!(verify_password("Aa1$aaaa", &second).expect("verify should succeed"));
    }

    #[test]
    fn test_is_valid_email() {
        // Valid emails
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.org"));
        assert!(is_valid_email("user+tag@sub.domain.com"));
        assert!(is_valid_email("a@b.co"));

        // Invalid emails
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("test"));
        assert!(!is_valid_email("test@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("test@example"));
        assert!(!is_valid_email("test@.com"));
        assert!(!is_valid_email("test@example."));
        assert!(!is_valid_email("test@@example.com"));
    }

    #[test]
    fn test_token_round_trip() {
        let secret = test_secret();
        let token = issue_access_token("alice@example.com", Duration::minutes(30), &secret)
            .expect("issuing should succeed");

        let claims = decode_access_token(&token, &secret).expect("decoding should succeed");
        assert_eq!(claims.sub, "alice@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = test_secret();
        // Expired well past jsonwebtoken's default leeway.
        let token = issue_access_token("alice@example.com", Duration::hours(-2), &secret)
            .expect("issuing should succeed");

        assert!(matches!(
            decode_access_token(&token, &secret),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let secret = test_secret();
        let token = issue_access_token("alice@example.com", Duration::minutes(30), &secret)
            .expect("issuing should succeed");

        // Flip a character in the payload segment.
        let tampered: String = token
            .char_indices()
            .map(|(i, c)| if i == token.len() / 2 { '0' } else { c })
            .collect();

        if tampered != token {
            assert!(matches!(
                decode_access_token(&tampered, &secret),
                Err(TokenError::Invalid)
            ));
        }

        // Wrong secret is also a tamper case.
        assert!(matches!(
            decode_access_token(&token, &[9u8; 32]),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_oversized_token_rejected() {
        let secret = test_secret();
        let oversized = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        assert!(matches!(
            decode_access_token(&oversized, &secret),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_claims_debug_redacts_subject() {
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            exp: 2,
            iat: 1,
        };
        let debug = format!("{:?}", claims);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("alice@example.com"));
    }
}
