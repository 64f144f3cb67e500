//! RS256 assertions for the OAuth2 JWT bearer grant (RFC 7523).
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::ServiceAccountKey;
use crate::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Lifetime requested for each assertion; Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Builds and signs the assertion a service account exchanges for an access token.
pub fn sign_assertion(
    key: &ServiceAccountKey,
    scope: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let iat = now.timestamp();
    let claims = Claims {
        iss: key.client_email.clone(),
        scope: scope.to_string(),
        aud: key.token_uri.clone(),
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| GatewayError::Credentials(format!("Rejected private key: {}", e)))?;

    encode(&header, &claims, &encoding_key)
        .map_err(|e| GatewayError::Credentials(format!("Failed to sign JWT assertion: {}", e)))
}
