// Application configuration loaded once at startup

use std::env;

/// Runtime configuration, built from environment variables in `main` and
/// carried in `AppState`. Components receive it by reference; nothing
/// reads process environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// HS256 signing secret for session tokens.
    pub secret_access_token: String,
    /// Base URL the reset-password link and OAuth redirects point at.
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: String,
    pub ses_from_email: Option<String>,
    pub ses_region: String,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://auth_api.db".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        let secret_access_token = env::var("SECRET_ACCESS_TOKEN")
            .unwrap_or_else(|_| "replace_with_strong_secret".to_string());

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let google_redirect_uri = env::var("GOOGLE_OAUTH_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:8080/auth/google/callback".to_string());

        Self {
            database_url,
            port,
            secret_access_token,
            frontend_url,
            cors_origins,
            google_client_id: env::var("GOOGLE_CLIENT_ID").ok(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").ok(),
            google_redirect_uri,
            ses_from_email: env::var("AWS_SES_FROM_EMAIL").ok(),
            ses_region: env::var("AWS_SES_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        }
    }
}
