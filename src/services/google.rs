// src/services/google.rs
//! Google OAuth client
//!
//! Drives the authorization-code flow: consent URL generation, code
//! exchange, and fetching the verified profile used for account linking.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::common::Config;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Google OAuth not configured")]
    NotConfigured,

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: String,
    pub scope: Option<String>,
}

/// Verified profile fields consumed by the account-linking flow
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Google's stable subject identifier
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

#[derive(Debug, Clone)]
pub struct GoogleService {
    client_id: Option<String>,
    client_secret: Option<String>,
    client: Client,
}

impl GoogleService {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            client,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), GoogleError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(GoogleError::NotConfigured),
        }
    }

    /// Build the consent-page URL for the authorization-code flow.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String, GoogleError> {
        let (client_id, _) = self.credentials()?;

        // Only identity scopes: the profile is all account linking needs
        let scope_param = "openid email profile";

        let auth_url = format!(
            "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}",
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(scope_param)
        );

        debug!("Generated Google OAuth authorization URL");
        Ok(auth_url)
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, GoogleError> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&params)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Token exchange failed");
            return Err(GoogleError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let token_response = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))?;

        info!("Successfully exchanged authorization code for tokens");
        Ok(token_response)
    }

    /// Fetch the authenticated user's profile with the access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, GoogleError> {
        let response = self
            .client
            .get("https://www.googleapis.com/oauth2/v2/userinfo")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GoogleError::RequestFailed(
                "Failed to get user info".to_string(),
            ));
        }

        response
            .json::<GoogleProfile>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(client_id: Option<&str>, client_secret: Option<&str>) -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            secret_access_token: "test_secret".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            cors_origins: vec![],
            google_client_id: client_id.map(str::to_string),
            google_client_secret: client_secret.map(str::to_string),
            google_redirect_uri: "http://localhost:8080/auth/google/callback".to_string(),
            ses_from_email: None,
            ses_region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_authorization_url_not_configured() {
        let service = GoogleService::new(&test_config(None, None));
        let result = service.authorization_url("http://localhost:8080/auth/google/callback");
        assert!(matches!(result, Err(GoogleError::NotConfigured)));
    }

    #[test]
    fn test_authorization_url_contains_identity_scopes() {
        let service = GoogleService::new(&test_config(Some("test_client_id"), Some("secret")));
        let auth_url = service
            .authorization_url("http://localhost:8080/auth/google/callback")
            .unwrap();

        assert!(auth_url.contains("accounts.google.com/o/oauth2/v2/auth"));
        assert!(auth_url.contains("client_id=test_client_id"));
        assert!(auth_url.contains("response_type=code"));
        assert!(auth_url.contains("openid%20email%20profile"));
    }
}
