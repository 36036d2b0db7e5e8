//! Catalog store: CRUD over the global menu/section/permission/office
//! definitions. Every write is scoped to one entity id and atomic per call;
//! bulk reorder runs inside a single transaction so a partial failure never
//! leaves a mixed ordering.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::menu::{Menu, MenuItem, SectionCategory, SectionItem};
use crate::models::office::{Office, OfficeCreateRequest, OfficeUpdateRequest};
use crate::models::permission::{PermissionCategory, PermissionItem, PermissionsCatalog};
use crate::models::ReorderEntry;
use crate::utils::utc_now;

/// Catalog tables addressable by the shared write operations. Table names
/// come from this enum only; caller input never reaches the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Menus,
    MenuItems,
    SectionCategories,
    SectionItems,
    PermissionCategories,
    PermissionItems,
    Offices,
}

impl CatalogTable {
    pub fn name(self) -> &'static str {
        match self {
            CatalogTable::Menus => "menus",
            CatalogTable::MenuItems => "menu_items",
            CatalogTable::SectionCategories => "section_categories",
            CatalogTable::SectionItems => "section_items",
            CatalogTable::PermissionCategories => "permission_categories",
            CatalogTable::PermissionItems => "permission_items",
            CatalogTable::Offices => "offices",
        }
    }
}

// =============================================================================
// SHARED WRITE OPERATIONS
// =============================================================================

/// Flip the active flag of one catalog entry.
pub async fn set_active(
    pool: &SqlitePool,
    table: CatalogTable,
    id: Uuid,
    is_active: bool,
) -> AppResult<()> {
    let sql = format!(
        "UPDATE {} SET is_active = ?, updated_at = ? WHERE id = ?",
        table.name()
    );

    let result = sqlx::query(&sql)
        .bind(is_active)
        .bind(utc_now())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!(
            "{} entry not found",
            table.name()
        )));
    }

    Ok(())
}

/// Update title and/or sort order of one catalog entry.
pub async fn update_entry(
    pool: &SqlitePool,
    table: CatalogTable,
    id: Uuid,
    title: Option<&str>,
    sort_order: Option<i64>,
) -> AppResult<()> {
    let sql = format!(
        "UPDATE {} SET title = COALESCE(?, title), sort_order = COALESCE(?, sort_order), updated_at = ? WHERE id = ?",
        table.name()
    );

    let result = sqlx::query(&sql)
        .bind(title)
        .bind(sort_order)
        .bind(utc_now())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!(
            "{} entry not found",
            table.name()
        )));
    }

    Ok(())
}

/// Apply a bulk reorder in one transaction. Any missing id rolls the whole
/// batch back and reports a single aggregate error.
pub async fn reorder(
    pool: &SqlitePool,
    table: CatalogTable,
    entries: &[ReorderEntry],
) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let now = utc_now();
    let sql = format!(
        "UPDATE {} SET sort_order = ?, updated_at = ? WHERE id = ?",
        table.name()
    );

    for entry in entries {
        let result = sqlx::query(&sql)
            .bind(entry.sort_order)
            .bind(now)
            .bind(entry.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // dropping tx rolls back everything applied so far
            return Err(AppError::not_found(format!(
                "{} entry {} not found; reorder rolled back",
                table.name(),
                entry.id
            )));
        }
    }

    tx.commit().await?;
    Ok(())
}

// =============================================================================
// OFFICES
// =============================================================================

pub async fn list_offices(pool: &SqlitePool) -> AppResult<Vec<Office>> {
    let offices = sqlx::query_as::<_, Office>(
        "SELECT id, title, city, address, sort_order, is_active, created_at, updated_at FROM offices ORDER BY sort_order, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(offices)
}

pub async fn fetch_office(pool: &SqlitePool, id: Uuid) -> AppResult<Office> {
    sqlx::query_as::<_, Office>(
        "SELECT id, title, city, address, sort_order, is_active, created_at, updated_at FROM offices WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("office not found"))
}

pub async fn create_office(pool: &SqlitePool, req: &OfficeCreateRequest) -> AppResult<Office> {
    let id = Uuid::new_v4();
    let now = utc_now();
    let sort_order = match req.sort_order {
        Some(value) => value,
        None => next_sort_order(pool, CatalogTable::Offices).await?,
    };

    sqlx::query(
        "INSERT INTO offices (id, title, city, address, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(&req.title)
    .bind(&req.city)
    .bind(&req.address)
    .bind(sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    fetch_office(pool, id).await
}

pub async fn update_office(
    pool: &SqlitePool,
    id: Uuid,
    req: &OfficeUpdateRequest,
) -> AppResult<Office> {
    let mut office = fetch_office(pool, id).await?;

    if let Some(title) = req.title.as_ref() {
        office.title = title.clone();
    }
    if req.city.is_some() {
        office.city = req.city.clone();
    }
    if req.address.is_some() {
        office.address = req.address.clone();
    }
    if let Some(sort_order) = req.sort_order {
        office.sort_order = sort_order;
    }

    let now = utc_now();
    sqlx::query(
        "UPDATE offices SET title = ?, city = ?, address = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&office.title)
    .bind(&office.city)
    .bind(&office.address)
    .bind(office.sort_order)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    office.updated_at = now;
    Ok(office)
}

/// Hard-delete an office. Refused with `Conflict` while any user assignment
/// still references it; explicit unassignment must come first.
pub async fn delete_office(pool: &SqlitePool, id: Uuid) -> AppResult<Office> {
    let office = fetch_office(pool, id).await?;

    let mut tx = pool.begin().await?;

    let references: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM user_offices WHERE office_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

    if references > 0 {
        return Err(AppError::conflict(
            "office still has user assignments; revoke them first",
        ));
    }

    sqlx::query("DELETE FROM offices WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(office)
}

// =============================================================================
// MENUS & SECTIONS
// =============================================================================

pub async fn list_menus(pool: &SqlitePool) -> AppResult<Vec<Menu>> {
    let menus = sqlx::query_as::<_, Menu>(
        "SELECT id, title, menu_type, sort_order, is_active, created_at, updated_at FROM menus ORDER BY sort_order, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(menus)
}

pub async fn create_menu_item(
    pool: &SqlitePool,
    menu_id: Uuid,
    title: &str,
    sort_order: Option<i64>,
) -> AppResult<MenuItem> {
    let menu_exists: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM menus WHERE id = ?")
        .bind(menu_id)
        .fetch_one(pool)
        .await?;
    if menu_exists == 0 {
        return Err(AppError::not_found("menu not found"));
    }

    let id = Uuid::new_v4();
    let now = utc_now();
    let sort_order = match sort_order {
        Some(value) => value,
        None => next_sort_order(pool, CatalogTable::MenuItems).await?,
    };

    sqlx::query(
        "INSERT INTO menu_items (id, menu_id, title, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(menu_id)
    .bind(title)
    .bind(sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, MenuItem>(
        "SELECT id, menu_id, title, sort_order, is_active, created_at, updated_at FROM menu_items WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn create_section_category(
    pool: &SqlitePool,
    title: &str,
    sort_order: Option<i64>,
) -> AppResult<SectionCategory> {
    let id = Uuid::new_v4();
    let now = utc_now();
    let sort_order = match sort_order {
        Some(value) => value,
        None => next_sort_order(pool, CatalogTable::SectionCategories).await?,
    };

    sqlx::query(
        "INSERT INTO section_categories (id, title, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(title)
    .bind(sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, SectionCategory>(
        "SELECT id, title, sort_order, is_active, created_at, updated_at FROM section_categories WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn create_section_item(
    pool: &SqlitePool,
    category_id: Uuid,
    title: &str,
    sort_order: Option<i64>,
) -> AppResult<SectionItem> {
    let category_exists: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM section_categories WHERE id = ?")
            .bind(category_id)
            .fetch_one(pool)
            .await?;
    if category_exists == 0 {
        return Err(AppError::not_found("section category not found"));
    }

    let id = Uuid::new_v4();
    let now = utc_now();
    let sort_order = match sort_order {
        Some(value) => value,
        None => next_sort_order(pool, CatalogTable::SectionItems).await?,
    };

    sqlx::query(
        "INSERT INTO section_items (id, category_id, title, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(category_id)
    .bind(title)
    .bind(sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, SectionItem>(
        "SELECT id, category_id, title, sort_order, is_active, created_at, updated_at FROM section_items WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

// =============================================================================
// PERMISSIONS
// =============================================================================

pub async fn permissions_catalog(pool: &SqlitePool) -> AppResult<PermissionsCatalog> {
    let categories = sqlx::query_as::<_, PermissionCategory>(
        "SELECT id, title, sort_order, is_active, created_at, updated_at FROM permission_categories ORDER BY sort_order, id",
    )
    .fetch_all(pool)
    .await?;

    let items = sqlx::query_as::<_, PermissionItem>(
        r#"
        SELECT i.id, i.category_id, i.title, i.sort_order, i.is_active, i.created_at, i.updated_at
        FROM permission_items i
        INNER JOIN permission_categories c ON c.id = i.category_id
        ORDER BY c.sort_order, c.id, i.sort_order, i.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(PermissionsCatalog { categories, items })
}

pub async fn create_permission_category(
    pool: &SqlitePool,
    title: &str,
    sort_order: Option<i64>,
) -> AppResult<PermissionCategory> {
    let id = Uuid::new_v4();
    let now = utc_now();
    let sort_order = match sort_order {
        Some(value) => value,
        None => next_sort_order(pool, CatalogTable::PermissionCategories).await?,
    };

    sqlx::query(
        "INSERT INTO permission_categories (id, title, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(title)
    .bind(sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, PermissionCategory>(
        "SELECT id, title, sort_order, is_active, created_at, updated_at FROM permission_categories WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn create_permission_item(
    pool: &SqlitePool,
    category_id: Uuid,
    title: &str,
    sort_order: Option<i64>,
) -> AppResult<PermissionItem> {
    let category_exists: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM permission_categories WHERE id = ?")
            .bind(category_id)
            .fetch_one(pool)
            .await?;
    if category_exists == 0 {
        return Err(AppError::not_found("permission category not found"));
    }

    let id = Uuid::new_v4();
    let now = utc_now();
    let sort_order = match sort_order {
        Some(value) => value,
        None => next_sort_order(pool, CatalogTable::PermissionItems).await?,
    };

    sqlx::query(
        "INSERT INTO permission_items (id, category_id, title, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(category_id)
    .bind(title)
    .bind(sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, PermissionItem>(
        "SELECT id, category_id, title, sort_order, is_active, created_at, updated_at FROM permission_items WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

/// Next free slot at the end of a table's ordering.
async fn next_sort_order(pool: &SqlitePool, table: CatalogTable) -> AppResult<i64> {
    let sql = format!(
        "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM {}",
        table.name()
    );
    let next: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(next)
}
