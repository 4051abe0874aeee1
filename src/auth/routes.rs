//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/register` - Create a password-based account
/// - `POST /auth/login` - Verify credentials, set the session cookie
/// - `GET /auth/logout` - Revoke the presented session token
/// - `GET /auth/verify` - Check the session cookie
/// - `GET /auth/user` - Current user's public profile
/// - `POST /auth/request-reset-password` - Email a reset link
/// - `POST /auth/reset-password/:token` - Set a new password
/// - `GET /auth/verify-reset-password-token/:token` - Check a reset token
/// - `GET /auth/google` (+ `/callback`) - Google OAuth flow
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", get(handlers::logout))
        .route("/auth/verify", get(handlers::verify_session))
        .route("/auth/user", get(handlers::get_user))
        .route(
            "/auth/request-reset-password",
            post(handlers::request_reset_password),
        )
        .route("/auth/reset-password/:token", post(handlers::reset_password))
        .route(
            "/auth/verify-reset-password-token/:token",
            get(handlers::verify_reset_password_token),
        )
        .route("/auth/google", get(handlers::google_oauth_start))
        .route("/auth/google/callback", get(handlers::google_oauth_callback))
}
