//! Authentication handlers

use axum::extract::{Extension, Json, Path, Query};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::cookies::{extract_session_token, session_cookie};
use super::extractors::SessionUser;
use super::models::{
    LoginPayload, RegisterPayload, RequestResetPayload, ResetPasswordPayload,
};
use super::store::{self, NewUser, DUPLICATE_ACCOUNT_MESSAGE};
use super::tokens::sign_session_token;
use crate::common::{safe_email_log, ApiError, AppState};

pub const INVALID_CREDENTIALS_MESSAGE: &str =
    "Invalid email or password. Please try again with the correct credentials.";

pub const RESET_TOKEN_INVALID_MESSAGE: &str =
    "Password reset token is invalid or has expired.";

/// POST /auth/register
/// Creates a password-based account
///
/// # Request Body
/// ```json
/// {
///   "first_name": "John",
///   "last_name": "Doe",
///   "email": "john@example.com",
///   "password": "password123"
/// }
/// ```
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(
        email = %safe_email_log(&payload.email),
        "Received registration request"
    );

    // Pre-check keeps the common case cheap; the unique index catches a
    // race between two concurrent registrations with the same email,
    // and store::create maps that conflict to the same response.
    if state.store.find_by_email(&payload.email).await?.is_some() {
        warn!(
            email = %safe_email_log(&payload.email),
            "Registration rejected: account already exists"
        );
        return Err(ApiError::Conflict(DUPLICATE_ACCOUNT_MESSAGE.to_string()));
    }

    state
        .store
        .create(NewUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": [],
        "message": "Thank you for registering with us. Your account has been successfully created.",
    })))
}

/// POST /auth/login
/// Verifies credentials and issues a session cookie
///
/// Unknown email and wrong password produce byte-identical 401
/// responses, so the endpoint cannot be used to enumerate accounts.
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let user = state
        .store
        .find_by_email_with_password(&payload.email)
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            warn!(
                email = %safe_email_log(&payload.email),
                "Login failed: unknown email"
            );
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string()));
        }
    };

    // OAuth-only accounts have no hash and can never pass this check
    let password_matches = match user.password_hash.clone() {
        Some(hash) => store::verify_password(payload.password, hash).await?,
        None => false,
    };

    if !password_matches {
        warn!(
            user_id = %user.id,
            email = %safe_email_log(&user.email),
            "Login failed: password mismatch"
        );
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string()));
    }

    let token = sign_session_token(&user.id, &state.config.secret_access_token).map_err(|e| {
        error!(error = %e, user_id = %user.id, "Session token signing failed");
        ApiError::InternalServer("token signing failed".to_string())
    })?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User logged in"
    );

    let body = serde_json::json!({
        "status": "success",
        "data": [user.public_profile()],
        "message": "You have successfully logged in.",
    });

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
        Json(body),
    )
        .into_response())
}

/// GET /auth/logout
/// Revokes the presented session token
///
/// Idempotent: no cookie and already-revoked both end in 204, a fresh
/// revocation in 200. Repeating the call is never an error.
pub async fn logout(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let token = match extract_session_token(&headers) {
        Some(t) => t,
        None => return Ok(StatusCode::NO_CONTENT.into_response()),
    };

    if state.blacklist.is_revoked(&token).await? {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    state.blacklist.revoke(&token).await?;

    info!("User logged out");

    Ok((
        AppendHeaders([(
            HeaderName::from_static("clear-site-data"),
            "\"cookies\"".to_string(),
        )]),
        Json(serde_json::json!({ "message": "You are logged out!" })),
    )
        .into_response())
}

/// GET /auth/verify
/// Confirms the session cookie is valid
pub async fn verify_session(_session: SessionUser) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "You are authenticated",
    })))
}

/// GET /auth/user
/// Returns the current user's public profile
#[axum::debug_handler]
pub async fn get_user(session: SessionUser) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(serde_json::json!({
        "status": "success",
        "user": session.public_profile(),
    })))
}

/// POST /auth/request-reset-password
/// Issues a reset token and emails the reset link
///
/// Responds 404 for unknown emails; mail transport failure is reported
/// as 500, distinct from lookup failure.
pub async fn request_reset_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RequestResetPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = match state.store.find_by_email(&payload.email).await? {
        Some(u) => u,
        None => {
            warn!(
                email = %safe_email_log(&payload.email),
                "Reset request for unknown email"
            );
            return Err(ApiError::NotFound("User not found.".to_string()));
        }
    };

    let token = state.store.issue_reset_token(&user.id).await?;

    let reset_link = format!("{}/reset-password/{}", state.config.frontend_url, token);

    state
        .mail_service
        .send_reset_password_email(&user.email, &user.first_name, &reset_link)
        .await
        .map_err(|e| ApiError::MailError(e.to_string()))?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "Password reset link sent"
    );

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Password reset link sent to your email address.",
    })))
}

/// GET /auth/verify-reset-password-token/:token
/// Checks a reset token without consuming it
///
/// Wrong and expired tokens get the same 400 response.
pub async fn verify_reset_password_token(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if state.store.find_by_reset_token(&token).await?.is_none() {
        return Err(ApiError::BadRequest(RESET_TOKEN_INVALID_MESSAGE.to_string()));
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Password reset token is valid.",
    })))
}

/// POST /auth/reset-password/:token
/// Sets a new password and consumes the reset token
pub async fn reset_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    // Checked before the token lookup, independent of token validity
    if payload.password != payload.confirm_password {
        return Err(ApiError::BadRequest("Passwords do not match.".to_string()));
    }

    let user = match state.store.find_by_reset_token(&token).await? {
        Some(u) => u,
        None => {
            return Err(ApiError::BadRequest(RESET_TOKEN_INVALID_MESSAGE.to_string()));
        }
    };

    // Re-hashes through the credential store and clears both reset
    // fields together, so the token cannot be replayed.
    state.store.reset_password(&user.id, payload.password).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Password has been reset.",
    })))
}

/// GET /auth/google - Start Google OAuth flow
/// Redirects the user to Google's authorization page
pub async fn google_oauth_start(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    let auth_url = state
        .google_service
        .authorization_url(&state.config.google_redirect_uri)
        .map_err(|e| {
            error!(error = %e, "Failed to generate Google OAuth URL");
            ApiError::InternalServer("OAuth is not available".to_string())
        })?;

    info!("Starting Google OAuth flow");
    Ok(Redirect::to(&auth_url))
}

/// GET /auth/google/callback - Handle OAuth callback from Google
///
/// Links the verified profile to a local account (creating one on first
/// login), issues the same session cookie as the password path, and
/// redirects back to the frontend. Any failure redirects to the
/// frontend's failure destination — never a silent success.
pub async fn google_oauth_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let state = state_lock.read().await.clone();
    let failure_url = format!("{}/login?error=oauth_failed", state.config.frontend_url);

    if let Some(oauth_error) = params.get("error") {
        error!(oauth_error = %oauth_error, "Google OAuth returned error");
        return Redirect::to(&failure_url).into_response();
    }

    let code = match params.get("code") {
        Some(c) => c,
        None => {
            error!("No authorization code in OAuth callback");
            return Redirect::to(&failure_url).into_response();
        }
    };

    match oauth_login(&state, code).await {
        Ok(token) => (
            AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
            Redirect::to(&state.config.frontend_url),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Google OAuth login failed");
            Redirect::to(&failure_url).into_response()
        }
    }
}

/// Exchange the code, link the profile to a local user, and sign a
/// session token. Factored out so the callback can funnel every failure
/// into one redirect.
async fn oauth_login(state: &AppState, code: &str) -> Result<String, ApiError> {
    let token_response = state
        .google_service
        .exchange_code(code, &state.config.google_redirect_uri)
        .await
        .map_err(|e| ApiError::InternalServer(format!("code exchange failed: {}", e)))?;

    let profile = state
        .google_service
        .fetch_profile(&token_response.access_token)
        .await
        .map_err(|e| ApiError::InternalServer(format!("profile fetch failed: {}", e)))?;

    let user = match state.store.find_by_google_id(&profile.id).await? {
        Some(u) => u,
        None => {
            info!(
                email = %safe_email_log(&profile.email),
                provider = "google",
                "No linked account, creating one from profile"
            );
            state.store.create_google_user(&profile).await?
        }
    };

    let token = sign_session_token(&user.id, &state.config.secret_access_token).map_err(|e| {
        error!(error = %e, user_id = %user.id, "Session token signing failed");
        ApiError::InternalServer("token signing failed".to_string())
    })?;

    info!(
        user_id = %user.id,
        provider = "google",
        "User authenticated via Google OAuth"
    );

    Ok(token)
}
