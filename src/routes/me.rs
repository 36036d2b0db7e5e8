//! The caller's own effective views. Unassigned or inactive entries are
//! omitted entirely; a user never sees what they cannot use.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::errors::AppResult;
use crate::models::assignment::AssignmentKind;
use crate::resolver::EffectiveEntry;
use crate::routes::assignments::UserMenuView;
use crate::routes::auth::MessageResponse;
use crate::store::{assignment, views};

#[utoipa::path(
    get,
    path = "/me/menu",
    tag = "Me",
    responses((status = 200, description = "Own effective menu", body = UserMenuView)),
    security(("bearerAuth" = []))
)]
pub async fn my_menu(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> AppResult<Json<UserMenuView>> {
    let items = views::user_view(&state.pool, AssignmentKind::MenuItem, principal.user_id).await?;
    let sections =
        views::user_view(&state.pool, AssignmentKind::SectionItem, principal.user_id).await?;

    Ok(Json(UserMenuView { items, sections }))
}

#[utoipa::path(
    get,
    path = "/me/permissions",
    tag = "Me",
    responses((status = 200, description = "Own effective permissions", body = [EffectiveEntry])),
    security(("bearerAuth" = []))
)]
pub async fn my_permissions(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> AppResult<Json<Vec<EffectiveEntry>>> {
    let permissions =
        views::user_view(&state.pool, AssignmentKind::PermissionItem, principal.user_id).await?;
    Ok(Json(permissions))
}

#[utoipa::path(
    get,
    path = "/me/offices",
    tag = "Me",
    responses((status = 200, description = "Own effective offices", body = [EffectiveEntry])),
    security(("bearerAuth" = []))
)]
pub async fn my_offices(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> AppResult<Json<Vec<EffectiveEntry>>> {
    let offices = views::user_view(&state.pool, AssignmentKind::Office, principal.user_id).await?;
    Ok(Json(offices))
}

#[utoipa::path(
    put,
    path = "/me/offices/{id}/default",
    tag = "Me",
    params(("id" = Uuid, Path, description = "Office ID (must be assigned to the caller)")),
    responses(
        (status = 200, description = "Default office switched"),
        (status = 404, description = "Office not assigned to the caller"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn set_default_office(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(office_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    assignment::set_default_office(&state.pool, principal.user_id, office_id).await?;

    Ok(Json(MessageResponse::new("Default office updated")))
}
