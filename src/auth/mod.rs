//! Session authentication and the authorization gate.
//!
//! Sessions are opaque bearer tokens backed by rows in the `sessions` table.
//! Deleting a row revokes the session immediately; an expired row stays
//! queryable but no longer authenticates.

mod gate;

pub use gate::{AdminUser, CurrentUser};

use chrono::Duration;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::utils::{generate_session_token, hash_session_token, utc_now};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl_hours: i64,
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let ttl_hours = std::env::var("SESSION_TTL_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(24))
            .map_err(|_| AppError::configuration("SESSION_TTL_HOURS must be a valid integer"))?;

        Ok(Self { ttl_hours })
    }
}

/// The authenticated caller, resolved from a live session row.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == crate::models::user::roles::ADMIN
    }
}

/// Create a session row for `user_id` and return the raw bearer token.
/// Only the token digest is stored.
pub async fn issue_session(
    pool: &SqlitePool,
    config: &SessionConfig,
    user_id: Uuid,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> Result<String, AppError> {
    let token = generate_session_token();
    let now = utc_now();
    let expires_at = now + Duration::hours(config.ttl_hours);

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at, ip_address, user_agent) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(hash_session_token(&token))
    .bind(now)
    .bind(expires_at)
    .bind(ip_address)
    .bind(user_agent)
    .execute(pool)
    .await?;

    Ok(token)
}

/// Delete the session backing `token`, if any. Used by logout.
pub async fn revoke_session_by_token(pool: &SqlitePool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_session_token(token))
        .execute(pool)
        .await?;

    Ok(())
}
