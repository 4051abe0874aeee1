//! Session token signing and verification
//!
//! Stateless HS256 tokens with a 20 minute TTL. Validity of a presented
//! token additionally requires a blacklist check, see
//! [`crate::auth::blacklist`].

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::models::Claims;

pub const SESSION_TTL_MINUTES: i64 = 20;

/// Sign a session token binding `user_id` to an expiry 20 minutes out.
pub fn sign_session_token(
    user_id: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::minutes(SESSION_TTL_MINUTES)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the claims.
///
/// Always resolves to a `Result`; signature mismatch and expiry both
/// surface as `Err`, never a panic.
pub fn verify_session_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}
