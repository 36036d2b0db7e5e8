//! Catalog administration for menus, sections and permissions. Offices have
//! their own module; the write paths here all funnel through the catalog
//! store so the per-kind handlers stay thin.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::errors::AppResult;
use crate::events::log_activity;
use crate::models::menu::{
    CatalogEntryUpdateRequest, Menu, MenuItem, MenuItemCreateRequest, SectionCategory,
    SectionCategoryCreateRequest, SectionItem, SectionItemCreateRequest,
};
use crate::models::permission::{
    PermissionCategory, PermissionCategoryCreateRequest, PermissionItem,
    PermissionItemCreateRequest, PermissionsCatalog,
};
use crate::models::{ReorderRequest, ToggleRequest};
use crate::store::catalog::{self, CatalogTable};

// =============================================================================
// MENUS
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/menus",
    tag = "Catalog",
    responses((status = 200, description = "All menus", body = [Menu])),
    security(("bearerAuth" = []))
)]
pub async fn list_menus(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<Menu>>> {
    let menus = catalog::list_menus(&state.pool).await?;
    Ok(Json(menus))
}

#[utoipa::path(
    post,
    path = "/admin/menus/items",
    tag = "Catalog",
    request_body = MenuItemCreateRequest,
    responses((status = 201, description = "Menu item created", body = MenuItem)),
    security(("bearerAuth" = []))
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<MenuItemCreateRequest>,
) -> AppResult<(StatusCode, Json<MenuItem>)> {
    let item = catalog::create_menu_item(
        &state.pool,
        payload.menu_id,
        &payload.title,
        payload.sort_order,
    )
    .await?;

    log_activity(&state.event_bus, "created", Some(admin.user_id), &item);

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/admin/menus/items/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = CatalogEntryUpdateRequest,
    responses((status = 200, description = "Menu item updated")),
    security(("bearerAuth" = []))
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CatalogEntryUpdateRequest>,
) -> AppResult<StatusCode> {
    catalog::update_entry(
        &state.pool,
        CatalogTable::MenuItems,
        id,
        payload.title.as_deref(),
        payload.sort_order,
    )
    .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/admin/menus/items/{id}/toggle",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = ToggleRequest,
    responses((status = 200, description = "Active flag updated")),
    security(("bearerAuth" = []))
)]
pub async fn toggle_menu_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleRequest>,
) -> AppResult<StatusCode> {
    catalog::set_active(&state.pool, CatalogTable::MenuItems, id, payload.is_active).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/admin/menus/items/reorder",
    tag = "Catalog",
    request_body = ReorderRequest,
    responses((status = 200, description = "Ordering applied")),
    security(("bearerAuth" = []))
)]
pub async fn reorder_menu_items(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<ReorderRequest>,
) -> AppResult<StatusCode> {
    catalog::reorder(&state.pool, CatalogTable::MenuItems, &payload.entries).await?;
    Ok(StatusCode::OK)
}

// =============================================================================
// SECTIONS
// =============================================================================

#[utoipa::path(
    post,
    path = "/admin/sections/categories",
    tag = "Catalog",
    request_body = SectionCategoryCreateRequest,
    responses((status = 201, description = "Section category created", body = SectionCategory)),
    security(("bearerAuth" = []))
)]
pub async fn create_section_category(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<SectionCategoryCreateRequest>,
) -> AppResult<(StatusCode, Json<SectionCategory>)> {
    let category =
        catalog::create_section_category(&state.pool, &payload.title, payload.sort_order).await?;

    log_activity(&state.event_bus, "created", Some(admin.user_id), &category);

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    post,
    path = "/admin/sections/categories/{id}/toggle",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Section category ID")),
    request_body = ToggleRequest,
    responses((status = 200, description = "Active flag updated")),
    security(("bearerAuth" = []))
)]
pub async fn toggle_section_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleRequest>,
) -> AppResult<StatusCode> {
    catalog::set_active(
        &state.pool,
        CatalogTable::SectionCategories,
        id,
        payload.is_active,
    )
    .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/admin/sections/items",
    tag = "Catalog",
    request_body = SectionItemCreateRequest,
    responses((status = 201, description = "Section item created", body = SectionItem)),
    security(("bearerAuth" = []))
)]
pub async fn create_section_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<SectionItemCreateRequest>,
) -> AppResult<(StatusCode, Json<SectionItem>)> {
    let item = catalog::create_section_item(
        &state.pool,
        payload.category_id,
        &payload.title,
        payload.sort_order,
    )
    .await?;

    log_activity(&state.event_bus, "created", Some(admin.user_id), &item);

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/admin/sections/items/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Section item ID")),
    request_body = CatalogEntryUpdateRequest,
    responses((status = 200, description = "Section item updated")),
    security(("bearerAuth" = []))
)]
pub async fn update_section_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CatalogEntryUpdateRequest>,
) -> AppResult<StatusCode> {
    catalog::update_entry(
        &state.pool,
        CatalogTable::SectionItems,
        id,
        payload.title.as_deref(),
        payload.sort_order,
    )
    .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/admin/sections/items/{id}/toggle",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Section item ID")),
    request_body = ToggleRequest,
    responses((status = 200, description = "Active flag updated")),
    security(("bearerAuth" = []))
)]
pub async fn toggle_section_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleRequest>,
) -> AppResult<StatusCode> {
    catalog::set_active(&state.pool, CatalogTable::SectionItems, id, payload.is_active).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/admin/sections/items/reorder",
    tag = "Catalog",
    request_body = ReorderRequest,
    responses((status = 200, description = "Ordering applied")),
    security(("bearerAuth" = []))
)]
pub async fn reorder_section_items(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<ReorderRequest>,
) -> AppResult<StatusCode> {
    catalog::reorder(&state.pool, CatalogTable::SectionItems, &payload.entries).await?;
    Ok(StatusCode::OK)
}

// =============================================================================
// PERMISSIONS
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/permissions",
    tag = "Catalog",
    responses((status = 200, description = "Permission categories and items", body = PermissionsCatalog)),
    security(("bearerAuth" = []))
)]
pub async fn get_permissions_catalog(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<PermissionsCatalog>> {
    let catalog = catalog::permissions_catalog(&state.pool).await?;
    Ok(Json(catalog))
}

#[utoipa::path(
    post,
    path = "/admin/permissions/categories",
    tag = "Catalog",
    request_body = PermissionCategoryCreateRequest,
    responses((status = 201, description = "Permission category created", body = PermissionCategory)),
    security(("bearerAuth" = []))
)]
pub async fn create_permission_category(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<PermissionCategoryCreateRequest>,
) -> AppResult<(StatusCode, Json<PermissionCategory>)> {
    let category =
        catalog::create_permission_category(&state.pool, &payload.title, payload.sort_order)
            .await?;

    log_activity(&state.event_bus, "created", Some(admin.user_id), &category);

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    post,
    path = "/admin/permissions/categories/{id}/toggle",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Permission category ID")),
    request_body = ToggleRequest,
    responses((status = 200, description = "Active flag updated")),
    security(("bearerAuth" = []))
)]
pub async fn toggle_permission_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleRequest>,
) -> AppResult<StatusCode> {
    catalog::set_active(
        &state.pool,
        CatalogTable::PermissionCategories,
        id,
        payload.is_active,
    )
    .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/admin/permissions/items",
    tag = "Catalog",
    request_body = PermissionItemCreateRequest,
    responses((status = 201, description = "Permission item created", body = PermissionItem)),
    security(("bearerAuth" = []))
)]
pub async fn create_permission_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<PermissionItemCreateRequest>,
) -> AppResult<(StatusCode, Json<PermissionItem>)> {
    let item = catalog::create_permission_item(
        &state.pool,
        payload.category_id,
        &payload.title,
        payload.sort_order,
    )
    .await?;

    log_activity(&state.event_bus, "created", Some(admin.user_id), &item);

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/admin/permissions/items/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Permission item ID")),
    request_body = CatalogEntryUpdateRequest,
    responses((status = 200, description = "Permission item updated")),
    security(("bearerAuth" = []))
)]
pub async fn update_permission_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CatalogEntryUpdateRequest>,
) -> AppResult<StatusCode> {
    catalog::update_entry(
        &state.pool,
        CatalogTable::PermissionItems,
        id,
        payload.title.as_deref(),
        payload.sort_order,
    )
    .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/admin/permissions/items/{id}/toggle",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Permission item ID")),
    request_body = ToggleRequest,
    responses((status = 200, description = "Active flag updated")),
    security(("bearerAuth" = []))
)]
pub async fn toggle_permission_item(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleRequest>,
) -> AppResult<StatusCode> {
    catalog::set_active(&state.pool, CatalogTable::PermissionItems, id, payload.is_active).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/admin/permissions/items/reorder",
    tag = "Catalog",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Ordering applied"),
        (status = 404, description = "Unknown item in batch; nothing applied"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn reorder_permission_items(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<ReorderRequest>,
) -> AppResult<StatusCode> {
    catalog::reorder(&state.pool, CatalogTable::PermissionItems, &payload.entries).await?;
    Ok(StatusCode::OK)
}
