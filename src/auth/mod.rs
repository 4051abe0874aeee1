//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Credential verification and session issuance
//! - Session token signing, verification, and revocation
//! - The password-reset workflow
//! - Google OAuth account linking
//! - SessionUser extractor for protected routes

pub mod blacklist;
pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use extractors::SessionUser;
pub use models::User;
pub use routes::auth_routes;
