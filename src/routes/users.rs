use axum::extract::State;
use axum::Json;
use sqlx::Row;

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::errors::AppResult;
use crate::models::user::AdminUserRow;

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Admin",
    responses((status = 200, description = "Users with role, ban, 2FA and passkey flags", body = [AdminUserRow])),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<AdminUserRow>>> {
    // passkeys are registered by the external WebAuthn provider; we only
    // surface their presence
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.name, u.email, u.role, u.banned, u.ban_reason,
               u.two_factor_enabled, u.created_at,
               COUNT(p.id) AS passkey_count
        FROM users u
        LEFT JOIN passkeys p ON p.user_id = u.id
        GROUP BY u.id
        ORDER BY u.created_at DESC, u.id
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let users: Vec<AdminUserRow> = rows
        .iter()
        .map(|row| AdminUserRow {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            role: row.get("role"),
            banned: row.get("banned"),
            ban_reason: row.get("ban_reason"),
            two_factor_enabled: row.get("two_factor_enabled"),
            has_passkey: row.get::<i64, _>("passkey_count") > 0,
            created_at: row.get("created_at"),
        })
        .collect();

    Ok(Json(users))
}
