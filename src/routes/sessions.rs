//! Session administration. Session validity is owned by the auth layer; this
//! module only lists the backing rows and hard-deletes them. Deleting a row
//! revokes the session for every future request.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::Row;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::errors::{AppError, AppResult};
use crate::events::log_activity;
use crate::models::session::{SessionListQuery, SessionWithUser};
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/admin/sessions",
    tag = "Admin",
    params(("only_active" = Option<bool>, Query, description = "Keep only unexpired sessions")),
    responses((status = 200, description = "Sessions with user name/email", body = [SessionWithUser])),
    security(("bearerAuth" = []))
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<SessionListQuery>,
) -> AppResult<Json<Vec<SessionWithUser>>> {
    let now = utc_now();

    let rows = sqlx::query(
        r#"
        SELECT s.id, s.user_id, s.created_at, s.expires_at, s.ip_address, s.user_agent,
               u.name AS user_name, u.email AS user_email
        FROM sessions s
        INNER JOIN users u ON u.id = s.user_id
        ORDER BY s.created_at DESC, s.id
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let sessions: Vec<SessionWithUser> = rows
        .iter()
        .map(|row| {
            let expires_at: chrono::DateTime<chrono::Utc> = row.get("expires_at");
            SessionWithUser {
                id: row.get("id"),
                user_id: row.get("user_id"),
                user_name: row.get("user_name"),
                user_email: row.get("user_email"),
                created_at: row.get("created_at"),
                expires_at,
                ip_address: row.get("ip_address"),
                user_agent: row.get("user_agent"),
                is_active: expires_at > now,
            }
        })
        .filter(|session| !query.only_active || session.is_active)
        .collect();

    Ok(Json(sessions))
}

#[utoipa::path(
    delete,
    path = "/admin/sessions/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 404, description = "Session not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_session(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let row = sqlx::query(
        r#"
        SELECT s.id, s.user_id, s.created_at, s.expires_at, s.ip_address, s.user_agent,
               u.name AS user_name, u.email AS user_email
        FROM sessions s
        INNER JOIN users u ON u.id = s.user_id
        WHERE s.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("session not found"))?;

    let expires_at: chrono::DateTime<chrono::Utc> = row.get("expires_at");
    let session = SessionWithUser {
        id: row.get("id"),
        user_id: row.get("user_id"),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        created_at: row.get("created_at"),
        expires_at,
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        is_active: expires_at > utc_now(),
    };

    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    log_activity(&state.event_bus, "deleted", Some(admin.user_id), &session);

    Ok(StatusCode::NO_CONTENT)
}
