//! Per-user assignment administration: the admin views (every catalog entry
//! with assignment + effective-active flags for a target user) and the
//! grant/revoke/auto-assign mutations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::errors::{AppError, AppResult};
use crate::events::log_activity;
use crate::models::assignment::{AssignmentKind, UserAssignment};
use crate::resolver::EffectiveEntry;
use crate::store::{assignment, views};

/// The navigation part of a user's effective view: general menu items plus
/// categorised section items.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMenuView {
    pub items: Vec<EffectiveEntry>,
    pub sections: Vec<EffectiveEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AutoAssignResponse {
    pub created: u64,
}

fn parse_kind(kind: &str) -> AppResult<AssignmentKind> {
    kind.parse()
        .map_err(|_| AppError::bad_request(format!("unknown assignment kind: {kind}")))
}

/// Unknown target users yield empty views, not errors; the admin screens
/// render "no rows" instead of a fault page.
async fn user_exists(pool: &sqlx::SqlitePool, user_id: Uuid) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

// =============================================================================
// ADMIN VIEWS
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/users/{user_id}/menu",
    tag = "Assignments",
    params(("user_id" = Uuid, Path, description = "Target user ID")),
    responses((status = 200, description = "Menu catalog with assignment flags", body = UserMenuView)),
    security(("bearerAuth" = []))
)]
pub async fn get_user_menu(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserMenuView>> {
    if !user_exists(&state.pool, user_id).await? {
        return Ok(Json(UserMenuView {
            items: Vec::new(),
            sections: Vec::new(),
        }));
    }

    let items = views::admin_view(&state.pool, AssignmentKind::MenuItem, user_id).await?;
    let sections = views::admin_view(&state.pool, AssignmentKind::SectionItem, user_id).await?;

    Ok(Json(UserMenuView { items, sections }))
}

#[utoipa::path(
    get,
    path = "/admin/users/{user_id}/permissions",
    tag = "Assignments",
    params(("user_id" = Uuid, Path, description = "Target user ID")),
    responses((status = 200, description = "Permission catalog with assignment flags", body = [EffectiveEntry])),
    security(("bearerAuth" = []))
)]
pub async fn get_user_permissions(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<EffectiveEntry>>> {
    if !user_exists(&state.pool, user_id).await? {
        return Ok(Json(Vec::new()));
    }

    let permissions =
        views::admin_view(&state.pool, AssignmentKind::PermissionItem, user_id).await?;
    Ok(Json(permissions))
}

#[utoipa::path(
    get,
    path = "/admin/users/{user_id}/offices",
    tag = "Assignments",
    params(("user_id" = Uuid, Path, description = "Target user ID")),
    responses((status = 200, description = "Office catalog with assignment flags", body = [EffectiveEntry])),
    security(("bearerAuth" = []))
)]
pub async fn get_user_offices(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<EffectiveEntry>>> {
    if !user_exists(&state.pool, user_id).await? {
        return Ok(Json(Vec::new()));
    }

    let offices = views::admin_view(&state.pool, AssignmentKind::Office, user_id).await?;
    Ok(Json(offices))
}

// =============================================================================
// MUTATIONS
// =============================================================================

#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/assignments/{kind}/{entry_id}",
    tag = "Assignments",
    params(
        ("user_id" = Uuid, Path, description = "Target user ID"),
        ("kind" = String, Path, description = "menu-items | section-items | permission-items | offices"),
        ("entry_id" = Uuid, Path, description = "Catalog entry ID"),
    ),
    responses(
        (status = 201, description = "Entry granted (idempotent)", body = UserAssignment),
        (status = 404, description = "Catalog entry not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn grant_assignment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((user_id, kind, entry_id)): Path<(Uuid, String, Uuid)>,
) -> AppResult<(StatusCode, Json<UserAssignment>)> {
    let kind = parse_kind(&kind)?;

    let granted = assignment::grant(
        &state.pool,
        kind,
        user_id,
        entry_id,
        Some(admin.user_id),
        false,
    )
    .await?;

    log_activity(&state.event_bus, "granted", Some(admin.user_id), &granted);

    Ok((StatusCode::CREATED, Json(granted)))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{user_id}/assignments/{kind}/{entry_id}",
    tag = "Assignments",
    params(
        ("user_id" = Uuid, Path, description = "Target user ID"),
        ("kind" = String, Path, description = "menu-items | section-items | permission-items | offices"),
        ("entry_id" = Uuid, Path, description = "Catalog entry ID"),
    ),
    responses(
        (status = 204, description = "Assignment revoked"),
        (status = 404, description = "Assignment not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn revoke_assignment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((user_id, kind, entry_id)): Path<(Uuid, String, Uuid)>,
) -> AppResult<StatusCode> {
    let kind = parse_kind(&kind)?;

    let existing = assignment::fetch_assignment(&state.pool, kind, user_id, entry_id)
        .await?
        .ok_or_else(|| AppError::not_found("assignment not found"))?;

    assignment::revoke(&state.pool, kind, user_id, entry_id).await?;

    log_activity(&state.event_bus, "revoked", Some(admin.user_id), &existing);

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/assignments/{kind}/auto-assign",
    tag = "Assignments",
    params(
        ("user_id" = Uuid, Path, description = "Target user ID"),
        ("kind" = String, Path, description = "menu-items | section-items | permission-items | offices"),
    ),
    responses((status = 200, description = "Active catalog granted in bulk", body = AutoAssignResponse)),
    security(("bearerAuth" = []))
)]
pub async fn auto_assign(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((user_id, kind)): Path<(Uuid, String)>,
) -> AppResult<Json<AutoAssignResponse>> {
    let kind = parse_kind(&kind)?;

    let created =
        assignment::auto_assign_all(&state.pool, kind, user_id, Some(admin.user_id)).await?;

    tracing::info!(
        target_user = %user_id,
        kind = kind.as_str(),
        created,
        "auto-assign completed"
    );

    Ok(Json(AutoAssignResponse { created }))
}
