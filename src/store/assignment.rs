//! Assignment store: join rows granting catalog entries to users.
//!
//! Grants are idempotent on the `(user_id, entry_id)` unique constraint; a
//! repeated grant leaves the existing row untouched. Bulk auto-assign and
//! default-office switching run inside one transaction each.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::assignment::{AssignmentKind, UserAssignment};
use crate::resolver::AssignmentRow;
use crate::utils::utc_now;

/// Grant one catalog entry to a user. Returns the assignment row, whether it
/// was just created or already existed.
pub async fn grant(
    pool: &SqlitePool,
    kind: AssignmentKind,
    user_id: Uuid,
    entry_id: Uuid,
    granted_by: Option<Uuid>,
    auto_assigned: bool,
) -> AppResult<UserAssignment> {
    ensure_entry_exists(pool, kind, entry_id).await?;

    let now = utc_now();
    let sql = format!(
        "INSERT OR IGNORE INTO {} (id, user_id, {}, created_at, created_by, is_auto_assigned) VALUES (?, ?, ?, ?, ?, ?)",
        kind.assignment_table(),
        kind.entry_column()
    );

    sqlx::query(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(entry_id)
        .bind(now)
        .bind(granted_by)
        .bind(auto_assigned)
        .execute(pool)
        .await?;

    fetch_assignment(pool, kind, user_id, entry_id)
        .await?
        .ok_or_else(|| AppError::internal("grant did not persist"))
}

/// Remove a grant. `NotFound` when no such assignment exists.
pub async fn revoke(
    pool: &SqlitePool,
    kind: AssignmentKind,
    user_id: Uuid,
    entry_id: Uuid,
) -> AppResult<()> {
    let sql = format!(
        "DELETE FROM {} WHERE user_id = ? AND {} = ?",
        kind.assignment_table(),
        kind.entry_column()
    );

    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(entry_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("assignment not found"));
    }

    Ok(())
}

/// Grant every active catalog entry of `kind` to the user, one transaction.
/// Existing grants are left untouched, so repeating the call is a no-op.
/// Returns how many rows were newly created.
pub async fn auto_assign_all(
    pool: &SqlitePool,
    kind: AssignmentKind,
    user_id: Uuid,
    granted_by: Option<Uuid>,
) -> AppResult<u64> {
    let entry_sql = format!(
        "SELECT id FROM {} WHERE is_active = 1",
        kind.catalog_table()
    );
    let insert_sql = format!(
        "INSERT OR IGNORE INTO {} (id, user_id, {}, created_at, created_by, is_auto_assigned) VALUES (?, ?, ?, ?, ?, 1)",
        kind.assignment_table(),
        kind.entry_column()
    );

    let mut tx = pool.begin().await?;

    let entry_ids: Vec<Uuid> = sqlx::query_scalar(&entry_sql).fetch_all(&mut *tx).await?;

    let now = utc_now();
    let mut created = 0u64;
    for entry_id in entry_ids {
        let result = sqlx::query(&insert_sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(entry_id)
            .bind(now)
            .bind(granted_by)
            .execute(&mut *tx)
            .await?;
        created += result.rows_affected();
    }

    tx.commit().await?;
    Ok(created)
}

/// Mark one assigned office as the user's default. Transactional: the
/// previous default is cleared and the new one set inside the same
/// transaction, so a concurrent reader never observes zero or two defaults.
pub async fn set_default_office(
    pool: &SqlitePool,
    user_id: Uuid,
    office_id: Uuid,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let assigned: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM user_offices WHERE user_id = ? AND office_id = ?",
    )
    .bind(user_id)
    .bind(office_id)
    .fetch_one(&mut *tx)
    .await?;

    if assigned == 0 {
        return Err(AppError::not_found("office is not assigned to this user"));
    }

    sqlx::query("UPDATE user_offices SET is_default = 0 WHERE user_id = ? AND is_default = 1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE user_offices SET is_default = 1 WHERE user_id = ? AND office_id = ?")
        .bind(user_id)
        .bind(office_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// All assignment rows of `kind` for one user, as resolver input.
pub async fn list_for_user(
    pool: &SqlitePool,
    kind: AssignmentKind,
    user_id: Uuid,
) -> AppResult<Vec<AssignmentRow>> {
    let default_column = if kind == AssignmentKind::Office {
        "is_default"
    } else {
        "0 AS is_default"
    };
    let sql = format!(
        "SELECT id, {} AS entry_id, created_at, created_by, is_auto_assigned, {} FROM {} WHERE user_id = ?",
        kind.entry_column(),
        default_column,
        kind.assignment_table()
    );

    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| AssignmentRow {
            id: row.get("id"),
            entry_id: row.get("entry_id"),
            created_at: row.get("created_at"),
            created_by: row.get("created_by"),
            is_auto_assigned: row.get("is_auto_assigned"),
            is_default: row.get("is_default"),
        })
        .collect())
}

pub async fn fetch_assignment(
    pool: &SqlitePool,
    kind: AssignmentKind,
    user_id: Uuid,
    entry_id: Uuid,
) -> AppResult<Option<UserAssignment>> {
    let default_column = if kind == AssignmentKind::Office {
        "is_default"
    } else {
        "0 AS is_default"
    };
    let sql = format!(
        "SELECT id, user_id, {} AS entry_id, created_at, created_by, is_auto_assigned, {} FROM {} WHERE user_id = ? AND {} = ?",
        kind.entry_column(),
        default_column,
        kind.assignment_table(),
        kind.entry_column()
    );

    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(entry_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| UserAssignment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        entry_id: row.get("entry_id"),
        kind,
        created_at: row.get("created_at"),
        created_by: row.get("created_by"),
        is_auto_assigned: row.get("is_auto_assigned"),
        is_default: row.get("is_default"),
    }))
}

async fn ensure_entry_exists(
    pool: &SqlitePool,
    kind: AssignmentKind,
    entry_id: Uuid,
) -> AppResult<()> {
    let sql = format!("SELECT COUNT(1) FROM {} WHERE id = ?", kind.catalog_table());
    let count: i64 = sqlx::query_scalar(&sql).bind(entry_id).fetch_one(pool).await?;

    if count == 0 {
        return Err(AppError::not_found(format!(
            "{} entry not found",
            kind.as_str()
        )));
    }

    Ok(())
}
