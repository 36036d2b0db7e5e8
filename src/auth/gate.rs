use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::Row;
use uuid::Uuid;

use super::Principal;
use crate::app::AppState;
use crate::errors::AppError;
use crate::utils::{hash_session_token, utc_now};

/// `requireAuthenticated`: resolves the bearer token to a principal or fails
/// with `Unauthorized`. No store write happens before this runs, so a failed
/// check is side-effect free.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

/// `requireAdmin`: a `CurrentUser` whose role is `admin`; anything else is
/// `Forbidden`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("Authorization header missing"))
}

async fn resolve_principal(parts: &Parts, state: &AppState) -> Result<Principal, AppError> {
    let token = bearer_token(parts)?;

    let row = sqlx::query(
        r#"
        SELECT s.id AS session_id, s.expires_at, u.id AS user_id, u.name, u.email, u.role, u.banned
        FROM sessions s
        INNER JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = ?
        "#,
    )
    .bind(hash_session_token(token))
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("invalid session token"))?;

    let expires_at: chrono::DateTime<chrono::Utc> = row.get("expires_at");
    if expires_at <= utc_now() {
        return Err(AppError::unauthorized("session expired"));
    }

    let banned: bool = row.get("banned");
    if banned {
        return Err(AppError::unauthorized("account is banned"));
    }

    Ok(Principal {
        user_id: row.get::<Uuid, _>("user_id"),
        session_id: row.get::<Uuid, _>("session_id"),
        name: row.get("name"),
        email: row.get("email"),
        role: row.get("role"),
    })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolve_principal(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = resolve_principal(parts, state).await?;

        if !principal.is_admin() {
            tracing::debug!(user_id = %principal.user_id, "admin gate denied");
            return Err(AppError::forbidden("admin role required"));
        }

        Ok(AdminUser(principal))
    }
}
