use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::auth::{issue_session, revoke_session_by_token, CurrentUser};
use crate::errors::{AppError, AppResult};
use crate::events::log_activity;
use crate::models::user::{AuthResponse, DbUser, LoginRequest, User};
use crate::utils::verify_password;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let db_user = fetch_user_by_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    if !verify_password(&payload.password, &db_user.password_hash)? {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    if db_user.banned {
        return Err(AppError::unauthorized("account is banned"));
    }

    let token = issue_session(
        &state.pool,
        &state.session,
        db_user.id,
        client_ip(&headers),
        user_agent(&headers),
    )
    .await?;

    let user: User = db_user.try_into()?;
    log_activity(&state.event_bus, "login", Some(user.id), &user);

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Current user", body = User)),
    security(("bearerAuth" = []))
)]
pub async fn me(State(state): State<AppState>, CurrentUser(principal): CurrentUser) -> AppResult<Json<User>> {
    let db_user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, password_hash, role, banned, ban_reason, two_factor_enabled, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(principal.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("user not found"))?;

    let user: User = db_user.try_into()?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Session revoked")),
    security(("bearerAuth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    CurrentUser(_principal): CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    if let Some(token) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        revoke_session_by_token(&state.pool, token).await?;
    }

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

async fn fetch_user_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, password_hash, role, banned, ban_reason, two_factor_enabled, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        })
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
