//! Session cookie contract
//!
//! The session token travels in a `SessionID` cookie: HttpOnly, Secure,
//! SameSite=None, Max-Age matching the token TTL.

use axum::http::{header, HeaderMap};

use super::tokens::SESSION_TTL_MINUTES;

pub const SESSION_COOKIE_NAME: &str = "SessionID";

/// Build the `Set-Cookie` header value for a freshly issued session token.
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=None",
        SESSION_COOKIE_NAME,
        token,
        SESSION_TTL_MINUTES * 60
    )
}

/// Extract the session token from a request's `Cookie` header.
///
/// Parses `name=value; ...` pairs and returns the `SessionID` value.
/// Absent or malformed headers yield `None`, never an error.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
