//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::cookies::extract_session_token;
use super::tokens::verify_session_token;
use crate::common::{safe_email_log, safe_token_log, ApiError, AppState};

pub const SESSION_EXPIRED_MESSAGE: &str = "This session has expired. Please login to continue.";

/// Authenticated session extractor
///
/// Validates the `SessionID` cookie: the token must parse, must not be
/// blacklisted, must carry a valid signature and expiry, and must
/// resolve to an existing user. Every failure maps to the same generic
/// 401 so a caller cannot tell which check rejected it. The attached
/// identity never includes the password hash.
#[derive(Debug)]
pub struct SessionUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    /// The exact bearer token value, kept for revocation on logout.
    pub token: String,
}

impl SessionUser {
    pub fn public_profile(&self) -> super::models::PublicProfile {
        super::models::PublicProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }

    /// Secondary authorization check for role-gated routes.
    pub fn require_privileged(&self) -> Result<(), ApiError> {
        if self.role == super::models::ROLE_PRIVILEGED {
            Ok(())
        } else {
            warn!(user_id = %self.id, "Privileged route rejected standard account");
            Err(ApiError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = match extract_session_token(&parts.headers) {
            Some(t) => t,
            None => {
                warn!("Session check failed: missing session cookie");
                return Err(ApiError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()));
            }
        };

        // Revocation-first: skip signature work for known-revoked tokens
        if app_state.blacklist.is_revoked(&token).await? {
            warn!(
                token = %safe_token_log(&token),
                "Session check failed: token is blacklisted"
            );
            return Err(ApiError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()));
        }

        let claims =
            match verify_session_token(&token, &app_state.config.secret_access_token) {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "Session token validation failed");
                    return Err(ApiError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()));
                }
            };

        let user = app_state.store.find_by_id(&claims.sub).await?;

        match user {
            Some(u) => {
                debug!(
                    user_id = %u.id,
                    email = %safe_email_log(&u.email),
                    "Session verified"
                );
                Ok(SessionUser {
                    id: u.id,
                    first_name: u.first_name,
                    last_name: u.last_name,
                    email: u.email,
                    role: u.role,
                    token,
                })
            }
            None => {
                warn!(user_id = %claims.sub, "Session check failed: user not found");
                Err(ApiError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()))
            }
        }
    }
}
