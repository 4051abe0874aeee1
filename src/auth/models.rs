//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Canonical session token claims
///
/// Both the password and the OAuth login paths sign exactly this shape;
/// `sub` is the local user id.
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub const ROLE_STANDARD: &str = "standard";
pub const ROLE_PRIVILEGED: &str = "privileged";

/// User database model
///
/// Deliberately not `Serialize`: responses go through
/// [`PublicProfile`] so the password hash can never leak.
#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// None for OAuth-only accounts, and for rows fetched by the
    /// default (hash-excluding) queries.
    pub password_hash: Option<String>,
    pub role: String,
    pub google_id: Option<String>,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl User {
    pub fn is_privileged(&self) -> bool {
        self.role == ROLE_PRIVILEGED
    }

    /// The only user projection that crosses the response boundary.
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Non-sensitive profile fields returned to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// POST /auth/register request body
#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// POST /auth/login request body
#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// POST /auth/request-reset-password request body
#[derive(Deserialize, Debug)]
pub struct RequestResetPayload {
    pub email: String,
}

/// POST /auth/reset-password/:token request body
#[derive(Deserialize, Debug)]
pub struct ResetPasswordPayload {
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
}
