//! Credential store
//!
//! Owns user records, password hashing, and reset-token issuance. All
//! lookups bind inputs as literal SQL parameters, so an email like
//! `{"$gt": ""}` is just a string that matches nothing. Queries exclude
//! the password hash unless the caller explicitly asks for it.

use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use super::models::{User, ROLE_STANDARD};
use crate::common::{generate_user_id, safe_email_log, ApiError};
use crate::services::google::GoogleProfile;

/// bcrypt work factor for password hashing
pub const HASH_COST: u32 = 10;

/// Reset tokens are 20 random bytes, hex-encoded
pub const RESET_TOKEN_BYTES: usize = 20;

pub const DUPLICATE_ACCOUNT_MESSAGE: &str =
    "It seems you already have an account, please log in instead.";

/// Default column list; the password hash is replaced with NULL so it
/// never leaves the database unless explicitly selected.
const USER_COLUMNS: &str = "id, first_name, last_name, email, NULL AS password_hash, role, \
     google_id, reset_password_token, reset_password_expires, created_at, updated_at";

const USER_COLUMNS_WITH_PASSWORD: &str = "id, first_name, last_name, email, password_hash, role, \
     google_id, reset_password_token, reset_password_expires, created_at, updated_at";

/// Fields for a password-based registration
#[derive(Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Hash a plaintext password with bcrypt
///
/// CPU-bound, so it runs on the blocking pool. This is the single
/// before-save transform for passwords: it is invoked only when a
/// password is being set or changed, so stored hashes are never
/// re-hashed.
pub async fn hash_password(plain: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, HASH_COST))
        .await
        .map_err(|e| ApiError::InternalServer(format!("hashing task failed: {}", e)))?
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            ApiError::InternalServer("password hashing failed".to_string())
        })
}

/// Compare a plaintext password against a stored bcrypt hash
pub async fn verify_password(plain: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| ApiError::InternalServer(format!("hashing task failed: {}", e)))?
        .map_err(|e| {
            error!(error = %e, "Password comparison failed");
            ApiError::InternalServer("password comparison failed".to_string())
        })
}

/// Emails are stored and looked up lowercased and trimmed.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Data access for user records
#[derive(Clone)]
pub struct CredentialStore {
    db: SqlitePool,
}

impl CredentialStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Exact-match lookup by email; password hash excluded.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let email = normalize_email(email);
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(&email)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    /// Lookup by email including the stored hash, for credential checks.
    pub async fn find_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<User>, ApiError> {
        let email = normalize_email(email);
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS_WITH_PASSWORD
        ))
        .bind(&email)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE google_id = ?",
            USER_COLUMNS
        ))
        .bind(google_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    /// Create a password-based account.
    ///
    /// Uniqueness is enforced by the email index; a losing racer gets
    /// the same duplicate-account conflict as the pre-checked path.
    pub async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        let password_hash = hash_password(new_user.password).await?;
        let id = generate_user_id();
        let email = normalize_email(&new_user.email);

        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, role) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(new_user.first_name.trim())
        .bind(new_user.last_name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(ROLE_STANDARD)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict(DUPLICATE_ACCOUNT_MESSAGE.to_string())
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

        info!(user_id = %id, email = %safe_email_log(&email), "User account created");

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| ApiError::InternalServer("created user not found".to_string()))
    }

    /// Create an account from a verified Google profile; no local password.
    pub async fn create_google_user(&self, profile: &GoogleProfile) -> Result<User, ApiError> {
        let id = generate_user_id();
        let email = normalize_email(&profile.email);

        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, google_id, role) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&profile.given_name)
        .bind(&profile.family_name)
        .bind(&email)
        .bind(&profile.id)
        .bind(ROLE_STANDARD)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %id,
            email = %safe_email_log(&email),
            provider = "google",
            "User account created via OAuth"
        );

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| ApiError::InternalServer("created user not found".to_string()))
    }

    /// Issue a password-reset token: 20 random bytes hex-encoded, expiry
    /// one hour out. Token and expiry are persisted together.
    pub async fn issue_reset_token(&self, user_id: &str) -> Result<String, ApiError> {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        rand::thread_rng().fill(&mut bytes[..]);
        let token = hex::encode(bytes);

        sqlx::query(
            "UPDATE users SET reset_password_token = ?, \
             reset_password_expires = datetime('now', '+1 hour'), \
             updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&token)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        debug!(user_id = %user_id, "Reset token issued");

        Ok(token)
    }

    /// Lookup by reset token, valid only while the expiry is strictly in
    /// the future. Wrong and expired tokens are indistinguishable to the
    /// caller.
    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE reset_password_token = ? \
             AND reset_password_expires > datetime('now')",
            USER_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    /// Set a new password and clear both reset fields in one statement,
    /// making the token single-use.
    pub async fn reset_password(&self, user_id: &str, new_password: String) -> Result<(), ApiError> {
        let password_hash = hash_password(new_password).await?;

        sqlx::query(
            "UPDATE users SET password_hash = ?, reset_password_token = NULL, \
             reset_password_expires = NULL, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&password_hash)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, "Password reset completed");

        Ok(())
    }
}
