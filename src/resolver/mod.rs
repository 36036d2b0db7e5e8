//! Effective-view computation.
//!
//! Pure functions joining catalog rows with a user's assignment rows. Two
//! derived booleans per entry:
//! - `is_assigned`: an assignment row exists for (user, entry)
//! - `is_effective_active`: entry active AND assigned AND parent active (or
//!   no parent)
//!
//! The admin view keeps every catalog row so grantable-but-ungranted entries
//! stay visible; the user view keeps only entries the caller can actually
//! use. Results are recomputed on every query, never cached.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Owning menu or category of a catalog entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParentRef {
    pub id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub is_active: bool,
}

/// One catalog row fed into the resolver, independent of kind.
#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub parent: Option<ParentRef>,
}

/// One assignment row scoped to the target user.
#[derive(Debug, Clone)]
pub struct AssignmentRow {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub is_auto_assigned: bool,
    pub is_default: bool,
}

/// A catalog entry joined with the user's assignment state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EffectiveEntry {
    pub id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
    pub is_assigned: bool,
    pub is_effective_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<Uuid>,
    pub is_auto_assigned: bool,
    pub is_default: bool,
}

/// Every catalog row joined with assignment state, audit columns included.
/// Unassigned entries are preserved so the admin screen can offer them.
pub fn resolve_admin_view(
    mut catalog: Vec<CatalogRow>,
    assignments: &[AssignmentRow],
) -> Vec<EffectiveEntry> {
    let by_entry: HashMap<Uuid, &AssignmentRow> =
        assignments.iter().map(|a| (a.entry_id, a)).collect();

    // Parent sort first, then the entry's own sort, id as the final
    // tie-break so repeated calls over unchanged data give a stable order.
    catalog.sort_by_key(|row| {
        (
            row.parent.as_ref().map(|p| (p.sort_order, p.id)),
            row.sort_order,
            row.id,
        )
    });

    catalog
        .into_iter()
        .map(|row| {
            let assignment = by_entry.get(&row.id);
            let is_assigned = assignment.is_some();
            let parent_active = row.parent.as_ref().map(|p| p.is_active).unwrap_or(true);
            let is_effective_active = row.is_active && is_assigned && parent_active;

            EffectiveEntry {
                id: row.id,
                title: row.title,
                sort_order: row.sort_order,
                is_active: row.is_active,
                parent: row.parent,
                is_assigned,
                is_effective_active,
                assignment_id: assignment.map(|a| a.id),
                assigned_at: assignment.map(|a| a.created_at),
                assigned_by: assignment.and_then(|a| a.created_by),
                is_auto_assigned: assignment.map(|a| a.is_auto_assigned).unwrap_or(false),
                is_default: assignment.map(|a| a.is_default).unwrap_or(false),
            }
        })
        .collect()
}

/// The caller's own view: only entries that are effectively active. A user
/// never sees entries they cannot use.
pub fn resolve_user_view(
    catalog: Vec<CatalogRow>,
    assignments: &[AssignmentRow],
) -> Vec<EffectiveEntry> {
    resolve_admin_view(catalog, assignments)
        .into_iter()
        .filter(|entry| entry.is_effective_active)
        .collect()
}
