//! Stateless signed tokens for sessions and password resets.
//!
//! Tokens are HS256 JWTs carrying the user id, a purpose claim, and an
//! expiry. There is no server-side revocation: a token stays valid until its
//! expiry elapses or the signing secret changes.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum TokenPurpose {
    Session,
    Reset,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct Claims {
    pub(super) sub: Uuid,
    pub(super) purpose: TokenPurpose,
    pub(super) iat: i64,
    pub(super) exp: i64,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum TokenError {
    Expired,
    Invalid,
}

/// Sign a token for the given user and purpose.
pub(super) fn issue(
    secret: &SecretString,
    user_id: Uuid,
    purpose: TokenPurpose,
    ttl_seconds: i64,
) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        purpose,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|err| anyhow::anyhow!("Failed to sign token: {err}"))
}

/// Validate signature, expiry, and purpose; expired and invalid are
/// distinguishable so callers can report them separately.
pub(super) fn verify(
    secret: &SecretString,
    token: &str,
    purpose: TokenPurpose,
) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let token_data =
        decode::<Claims>(token, &decoding_key, &Validation::default()).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

    if token_data.claims.purpose != purpose {
        return Err(TokenError::Invalid);
    }

    Ok(token_data.claims)
}
