use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::errors::AppResult;
use crate::events::log_activity;
use crate::models::office::{Office, OfficeCreateRequest, OfficeUpdateRequest};
use crate::models::{ReorderRequest, ToggleRequest};
use crate::store::catalog::{self, CatalogTable};

#[utoipa::path(
    get,
    path = "/admin/offices",
    tag = "Offices",
    responses((status = 200, description = "Ordered office records", body = [Office])),
    security(("bearerAuth" = []))
)]
pub async fn list_offices(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<Office>>> {
    let offices = catalog::list_offices(&state.pool).await?;
    Ok(Json(offices))
}

#[utoipa::path(
    post,
    path = "/admin/offices",
    tag = "Offices",
    request_body = OfficeCreateRequest,
    responses((status = 201, description = "Office created", body = Office)),
    security(("bearerAuth" = []))
)]
pub async fn create_office(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<OfficeCreateRequest>,
) -> AppResult<(StatusCode, Json<Office>)> {
    let office = catalog::create_office(&state.pool, &payload).await?;

    log_activity(&state.event_bus, "created", Some(admin.user_id), &office);

    Ok((StatusCode::CREATED, Json(office)))
}

#[utoipa::path(
    put,
    path = "/admin/offices/{id}",
    tag = "Offices",
    params(("id" = Uuid, Path, description = "Office ID")),
    request_body = OfficeUpdateRequest,
    responses(
        (status = 200, description = "Office updated", body = Office),
        (status = 404, description = "Office not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_office(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<OfficeUpdateRequest>,
) -> AppResult<Json<Office>> {
    let office = catalog::update_office(&state.pool, id, &payload).await?;

    log_activity(&state.event_bus, "updated", Some(admin.user_id), &office);

    Ok(Json(office))
}

#[utoipa::path(
    post,
    path = "/admin/offices/{id}/toggle",
    tag = "Offices",
    params(("id" = Uuid, Path, description = "Office ID")),
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Active flag updated", body = Office),
        (status = 404, description = "Office not found"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn toggle_office(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleRequest>,
) -> AppResult<Json<Office>> {
    catalog::set_active(&state.pool, CatalogTable::Offices, id, payload.is_active).await?;
    let office = catalog::fetch_office(&state.pool, id).await?;

    log_activity(&state.event_bus, "updated", Some(admin.user_id), &office);

    Ok(Json(office))
}

#[utoipa::path(
    put,
    path = "/admin/offices/reorder",
    tag = "Offices",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Ordering applied"),
        (status = 404, description = "Unknown office in batch; nothing applied"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn reorder_offices(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<ReorderRequest>,
) -> AppResult<StatusCode> {
    catalog::reorder(&state.pool, CatalogTable::Offices, &payload.entries).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/admin/offices/{id}",
    tag = "Offices",
    params(("id" = Uuid, Path, description = "Office ID")),
    responses(
        (status = 204, description = "Office deleted"),
        (status = 404, description = "Office not found"),
        (status = 409, description = "Office still has user assignments"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_office(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let office = catalog::delete_office(&state.pool, id).await?;

    log_activity(&state.event_bus, "deleted", Some(admin.user_id), &office);

    Ok(StatusCode::NO_CONTENT)
}
