//! Revocation registry for logged-out session tokens
//!
//! A token present here is rejected even when its signature and expiry
//! are valid. Entries only need to outlive the longest possible token
//! TTL, so a background reaper purges them after an hour.

use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, error};

use crate::common::{safe_token_log, ApiError};

/// Retention window for revoked tokens
pub const REVOKED_TOKEN_TTL_SECONDS: i64 = 3600;

const REAPER_INTERVAL_SECONDS: u64 = 60;

#[derive(Clone)]
pub struct Blacklist {
    db: SqlitePool,
}

impl Blacklist {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Existence check by exact token string.
    pub async fn is_revoked(&self, token: &str) -> Result<bool, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM revoked_tokens WHERE token = ?")
                .bind(token)
                .fetch_one(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        Ok(count > 0)
    }

    /// Record a token as revoked. Idempotent: revoking an
    /// already-revoked token is a no-op, and a check-then-insert race
    /// between two logouts is harmless.
    pub async fn revoke(&self, token: &str) -> Result<(), ApiError> {
        sqlx::query("INSERT OR IGNORE INTO revoked_tokens (token) VALUES (?)")
            .bind(token)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        debug!(token = %safe_token_log(token), "Session token revoked");

        Ok(())
    }

    /// Spawn the background reaper that drops entries older than the
    /// retention window, regardless of read/write activity.
    pub fn start_reaper_task(db: SqlitePool) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(REAPER_INTERVAL_SECONDS));
            let cutoff = format!("-{} seconds", REVOKED_TOKEN_TTL_SECONDS);

            loop {
                interval.tick().await;

                match sqlx::query("DELETE FROM revoked_tokens WHERE created_at <= datetime('now', ?)")
                    .bind(&cutoff)
                    .execute(&db)
                    .await
                {
                    Ok(result) => {
                        if result.rows_affected() > 0 {
                            debug!(
                                purged = result.rows_affected(),
                                "Purged expired blacklist entries"
                            );
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Blacklist reaper query failed");
                    }
                }
            }
        });
    }
}
