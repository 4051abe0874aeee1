//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - Session token signing and verification
//! - Session cookie building and parsing
//! - Credential store operations against an in-memory database
//! - Blacklist semantics
//! - Route-level behavior through the full router

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
    use axum::{Extension, Router};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use crate::common::{AppState, Config};
    use crate::services::{GoogleService, MailService};

    async fn setup_test_db() -> sqlx::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        crate::common::migrations::run_migrations(&pool).await.unwrap();

        pool
    }

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            secret_access_token: "test_secret".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            cors_origins: vec![],
            google_client_id: None,
            google_client_secret: None,
            google_redirect_uri: "http://localhost:8080/auth/google/callback".to_string(),
            ses_from_email: None,
            ses_region: "us-east-1".to_string(),
        }
    }

    /// The auth router wired exactly as in `main`, backed by an
    /// in-memory database.
    async fn setup_test_app() -> Router {
        let pool = setup_test_db().await;
        let config = Arc::new(test_config());

        let state = AppState {
            config: config.clone(),
            store: store::CredentialStore::new(pool.clone()),
            blacklist: blacklist::Blacklist::new(pool),
            mail_service: Arc::new(MailService::new(&config)),
            google_service: Arc::new(GoogleService::new(&config)),
        };

        routes::auth_routes().layer(Extension(Arc::new(RwLock::new(state))))
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn cookie_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method("GET").uri(uri);
        let builder = match cookie {
            Some(c) => builder.header(header::COOKIE, format!("SessionID={}", c)),
            None => builder,
        };
        builder.body(Body::empty()).unwrap()
    }

    fn register_body(email: &str) -> serde_json::Value {
        serde_json::json!({
            "first_name": "John",
            "last_name": "Doe",
            "email": email,
            "password": "password123",
        })
    }

    fn new_user(email: &str) -> store::NewUser {
        store::NewUser {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    // ---- Token service ----

    #[test]
    fn test_session_token_roundtrip() {
        let token = tokens::sign_session_token("U_ABC123", "test_secret").unwrap();
        let claims = tokens::verify_session_token(&token, "test_secret").unwrap();

        assert_eq!(claims.sub, "U_ABC123");
    }

    #[test]
    fn test_session_token_rejects_wrong_secret() {
        let token = tokens::sign_session_token("U_ABC123", "test_secret").unwrap();
        let result = tokens::verify_session_token(&token, "other_secret");

        assert!(result.is_err(), "Token must fail with the wrong secret");
    }

    #[test]
    fn test_session_token_rejects_expired() {
        // Expired well past the default validation leeway
        let claims = models::Claims {
            sub: "U_ABC123".to_string(),
            exp: 1_000_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_secret"),
        )
        .unwrap();

        let result = tokens::verify_session_token(&token, "test_secret");
        assert!(result.is_err(), "Expired token must fail verification");
    }

    // ---- Cookie contract ----

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = cookies::session_cookie("sometoken");

        assert!(cookie.starts_with("SessionID=sometoken;"));
        assert!(cookie.contains("Max-Age=1200"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_extract_session_token_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; SessionID=abc.def.ghi; lang=en"),
        );

        assert_eq!(
            cookies::extract_session_token(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_trailing_semicolon() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("SessionID=mocktoken;"));

        assert_eq!(
            cookies::extract_session_token(&headers),
            Some("mocktoken".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_absent_or_malformed() {
        let headers = HeaderMap::new();
        assert_eq!(cookies::extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("garbage-no-pairs"));
        assert_eq!(cookies::extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("SessionID="));
        assert_eq!(cookies::extract_session_token(&headers), None);
    }

    // ---- Response projection ----

    #[test]
    fn test_public_profile_has_no_sensitive_fields() {
        let user = models::User {
            id: "U_ABC123".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: Some("$2b$10$hash".to_string()),
            role: models::ROLE_STANDARD.to_string(),
            google_id: None,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: None,
            updated_at: None,
        };

        assert!(!user.is_privileged());

        let json = serde_json::to_value(user.public_profile()).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 3);
        assert_eq!(json["first_name"], "Jane");
        assert_eq!(json["last_name"], "Doe");
        assert_eq!(json["email"], "jane@example.com");
        assert!(obj.get("password_hash").is_none());
        assert!(obj.get("role").is_none());
    }

    #[test]
    fn test_role_gate_rejects_standard_accounts() {
        let session = extractors::SessionUser {
            id: "U_ABC123".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            role: models::ROLE_STANDARD.to_string(),
            token: "sometoken".to_string(),
        };
        assert!(session.require_privileged().is_err());

        let session = extractors::SessionUser {
            role: models::ROLE_PRIVILEGED.to_string(),
            ..session
        };
        assert!(session.require_privileged().is_ok());
    }

    // ---- Credential store ----

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let pool = setup_test_db().await;
        let store = store::CredentialStore::new(pool);

        store.create(new_user("john@example.com")).await.unwrap();

        // Same address, different case: still one account
        let result = store.create(new_user("JOHN@example.com")).await;
        match result {
            Err(crate::common::ApiError::Conflict(msg)) => {
                assert_eq!(msg, store::DUPLICATE_ACCOUNT_MESSAGE);
            }
            other => panic!("expected Conflict, got {:?}", other.map(|u| u.id)),
        }
    }

    #[tokio::test]
    async fn test_default_lookup_excludes_password_hash() {
        let pool = setup_test_db().await;
        let store = store::CredentialStore::new(pool);

        store.create(new_user("john@example.com")).await.unwrap();

        let user = store.find_by_email("john@example.com").await.unwrap().unwrap();
        assert!(user.password_hash.is_none());

        let user = store
            .find_by_email_with_password("john@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(user.password_hash.is_some());
    }

    #[tokio::test]
    async fn test_password_verification() {
        let pool = setup_test_db().await;
        let store = store::CredentialStore::new(pool);

        store.create(new_user("john@example.com")).await.unwrap();

        let hash = store
            .find_by_email_with_password("john@example.com")
            .await
            .unwrap()
            .unwrap()
            .password_hash
            .unwrap();

        assert!(
            store::verify_password("password123".to_string(), hash.clone())
                .await
                .unwrap()
        );
        assert!(
            !store::verify_password("wrongpassword".to_string(), hash)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_reset_token_format_and_single_use() {
        let pool = setup_test_db().await;
        let store = store::CredentialStore::new(pool);

        let user = store.create(new_user("john@example.com")).await.unwrap();
        let token = store.issue_reset_token(&user.id).await.unwrap();

        // 20 random bytes, hex-encoded
        assert_eq!(token.len(), store::RESET_TOKEN_BYTES * 2);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));

        let found = store.find_by_reset_token(&token).await.unwrap();
        assert!(found.is_some());

        store
            .reset_password(&user.id, "newpassword456".to_string())
            .await
            .unwrap();

        // Token consumed, both reset fields cleared
        assert!(store.find_by_reset_token(&token).await.unwrap().is_none());
        let user = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(user.reset_password_token.is_none());
        assert!(user.reset_password_expires.is_none());

        let hash = store
            .find_by_email_with_password("john@example.com")
            .await
            .unwrap()
            .unwrap()
            .password_hash
            .unwrap();
        assert!(
            store::verify_password("newpassword456".to_string(), hash)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_reset_token_expiry_is_strict() {
        let pool = setup_test_db().await;
        let store = store::CredentialStore::new(pool.clone());

        let user = store.create(new_user("john@example.com")).await.unwrap();
        let token = store.issue_reset_token(&user.id).await.unwrap();

        // Force the expiry to the current instant; strict > means expired
        sqlx::query("UPDATE users SET reset_password_expires = datetime('now') WHERE id = ?")
            .bind(&user.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(store.find_by_reset_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oauth_account_creation_and_lookup() {
        let pool = setup_test_db().await;
        let store = store::CredentialStore::new(pool);

        let profile = crate::services::google::GoogleProfile {
            id: "google-sub-123".to_string(),
            email: "jane@example.com".to_string(),
            given_name: "Jane".to_string(),
            family_name: "Doe".to_string(),
        };

        let created = store.create_google_user(&profile).await.unwrap();
        assert_eq!(created.google_id.as_deref(), Some("google-sub-123"));

        let found = store
            .find_by_google_id("google-sub-123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        // OAuth-only accounts carry no password hash
        let full = store
            .find_by_email_with_password("jane@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(full.password_hash.is_none());
    }

    // ---- Blacklist ----

    #[tokio::test]
    async fn test_blacklist_revoke_and_check() {
        let pool = setup_test_db().await;
        let blacklist = blacklist::Blacklist::new(pool);

        assert!(!blacklist.is_revoked("sometoken").await.unwrap());

        blacklist.revoke("sometoken").await.unwrap();
        assert!(blacklist.is_revoked("sometoken").await.unwrap());

        // Revocation is token-scoped, not user-scoped
        assert!(!blacklist.is_revoked("othertoken").await.unwrap());
    }

    #[tokio::test]
    async fn test_blacklist_revoke_is_idempotent() {
        let pool = setup_test_db().await;
        let blacklist = blacklist::Blacklist::new(pool);

        blacklist.revoke("sometoken").await.unwrap();
        // Second revocation of the same token must not error
        blacklist.revoke("sometoken").await.unwrap();

        assert!(blacklist.is_revoked("sometoken").await.unwrap());
    }

    // ---- Route-level behavior ----

    #[tokio::test]
    async fn test_logout_route_is_idempotent() {
        let app = setup_test_app().await;

        // No cookie at all: nothing to revoke
        let response = app
            .clone()
            .oneshot(cookie_request("/auth/logout", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // First logout with a cookie revokes and confirms
        let response = app
            .clone()
            .oneshot(cookie_request("/auth/logout", Some("sometoken")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("clear-site-data")
                .and_then(|v| v.to_str().ok()),
            Some("\"cookies\"")
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "You are logged out!");

        // Repeating with the same token is not an error
        let response = app
            .oneshot(cookie_request("/auth/logout", Some("sometoken")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "/auth/register",
                register_body("john@example.com"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Known email, wrong password
        let response = app
            .clone()
            .oneshot(json_request(
                "/auth/login",
                serde_json::json!({
                    "email": "john@example.com",
                    "password": "wrongpassword",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let wrong_password_body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        // Unknown email, byte-identical response
        let response = app
            .oneshot(json_request(
                "/auth/login",
                serde_json::json!({
                    "email": "nobody@example.com",
                    "password": "password123",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let unknown_email_body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        assert_eq!(wrong_password_body, unknown_email_body);
    }

    #[tokio::test]
    async fn test_revoked_session_cookie_fails_verification() {
        let app = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "/auth/register",
                register_body("john@example.com"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                "/auth/login",
                serde_json::json!({
                    "email": "john@example.com",
                    "password": "password123",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        let token = set_cookie
            .strip_prefix("SessionID=")
            .and_then(|rest| rest.split(';').next())
            .unwrap()
            .to_string();

        // Profile fields only, never the hash
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"][0]["email"], "john@example.com");
        assert!(body["data"][0].get("password_hash").is_none());

        // Fresh cookie passes the session check
        let response = app
            .clone()
            .oneshot(cookie_request("/auth/verify", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(cookie_request("/auth/logout", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Same cookie after logout: revoked, generic 401
        let response = app
            .oneshot(cookie_request("/auth/verify", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], extractors::SESSION_EXPIRED_MESSAGE);
    }
}
