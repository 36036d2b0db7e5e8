//! Catalog fetchers feeding the resolver. Each returns every catalog row of
//! one kind together with its parent menu/category, in raw (unsorted,
//! unjoined-with-assignments) form; the resolver does the rest.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::assignment::AssignmentKind;
use crate::resolver::{self, CatalogRow, EffectiveEntry, ParentRef};
use crate::store::assignment;

/// AdminView for one (user, kind): every catalog entry with assignment and
/// effective-active flags.
pub async fn admin_view(
    pool: &SqlitePool,
    kind: AssignmentKind,
    user_id: Uuid,
) -> AppResult<Vec<EffectiveEntry>> {
    let catalog = fetch_catalog_rows(pool, kind).await?;
    let assignments = assignment::list_for_user(pool, kind, user_id).await?;
    Ok(resolver::resolve_admin_view(catalog, &assignments))
}

/// UserView for one (user, kind): only entries the user can actually use.
pub async fn user_view(
    pool: &SqlitePool,
    kind: AssignmentKind,
    user_id: Uuid,
) -> AppResult<Vec<EffectiveEntry>> {
    let catalog = fetch_catalog_rows(pool, kind).await?;
    let assignments = assignment::list_for_user(pool, kind, user_id).await?;
    Ok(resolver::resolve_user_view(catalog, &assignments))
}

pub async fn fetch_catalog_rows(
    pool: &SqlitePool,
    kind: AssignmentKind,
) -> AppResult<Vec<CatalogRow>> {
    match kind {
        AssignmentKind::MenuItem => {
            fetch_with_parent(
                pool,
                r#"
                SELECT i.id, i.title, i.sort_order, i.is_active,
                       m.id AS parent_id, m.title AS parent_title,
                       m.sort_order AS parent_sort_order, m.is_active AS parent_is_active
                FROM menu_items i
                INNER JOIN menus m ON m.id = i.menu_id
                "#,
            )
            .await
        }
        AssignmentKind::SectionItem => {
            fetch_with_parent(
                pool,
                r#"
                SELECT i.id, i.title, i.sort_order, i.is_active,
                       c.id AS parent_id, c.title AS parent_title,
                       c.sort_order AS parent_sort_order, c.is_active AS parent_is_active
                FROM section_items i
                INNER JOIN section_categories c ON c.id = i.category_id
                "#,
            )
            .await
        }
        AssignmentKind::PermissionItem => {
            fetch_with_parent(
                pool,
                r#"
                SELECT i.id, i.title, i.sort_order, i.is_active,
                       c.id AS parent_id, c.title AS parent_title,
                       c.sort_order AS parent_sort_order, c.is_active AS parent_is_active
                FROM permission_items i
                INNER JOIN permission_categories c ON c.id = i.category_id
                "#,
            )
            .await
        }
        AssignmentKind::Office => {
            let rows = sqlx::query("SELECT id, title, sort_order, is_active FROM offices")
                .fetch_all(pool)
                .await?;

            Ok(rows
                .iter()
                .map(|row| CatalogRow {
                    id: row.get("id"),
                    title: row.get("title"),
                    sort_order: row.get("sort_order"),
                    is_active: row.get("is_active"),
                    parent: None,
                })
                .collect())
        }
    }
}

async fn fetch_with_parent(pool: &SqlitePool, sql: &str) -> AppResult<Vec<CatalogRow>> {
    let rows = sqlx::query(sql).fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| CatalogRow {
            id: row.get("id"),
            title: row.get("title"),
            sort_order: row.get("sort_order"),
            is_active: row.get("is_active"),
            parent: Some(ParentRef {
                id: row.get::<Uuid, _>("parent_id"),
                title: row.get("parent_title"),
                sort_order: row.get("parent_sort_order"),
                is_active: row.get("parent_is_active"),
            }),
        })
        .collect())
}
