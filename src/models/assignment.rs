use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::{Loggable, Severity};

/// The four kinds of catalog entry a user can be granted. Each kind owns its
/// assignment table; the enum keeps the table/column names in one place so the
/// store never concatenates caller-provided strings into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    MenuItem,
    SectionItem,
    PermissionItem,
    Office,
}

impl AssignmentKind {
    pub fn assignment_table(self) -> &'static str {
        match self {
            AssignmentKind::MenuItem => "user_menu_items",
            AssignmentKind::SectionItem => "user_section_items",
            AssignmentKind::PermissionItem => "user_permission_items",
            AssignmentKind::Office => "user_offices",
        }
    }

    pub fn catalog_table(self) -> &'static str {
        match self {
            AssignmentKind::MenuItem => "menu_items",
            AssignmentKind::SectionItem => "section_items",
            AssignmentKind::PermissionItem => "permission_items",
            AssignmentKind::Office => "offices",
        }
    }

    pub fn entry_column(self) -> &'static str {
        match self {
            AssignmentKind::Office => "office_id",
            _ => "item_id",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentKind::MenuItem => "menu_item",
            AssignmentKind::SectionItem => "section_item",
            AssignmentKind::PermissionItem => "permission_item",
            AssignmentKind::Office => "office",
        }
    }
}

impl std::str::FromStr for AssignmentKind {
    type Err = ();

    /// Accepts the kebab-case path segments used by the admin routes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menu-items" => Ok(AssignmentKind::MenuItem),
            "section-items" => Ok(AssignmentKind::SectionItem),
            "permission-items" => Ok(AssignmentKind::PermissionItem),
            "offices" => Ok(AssignmentKind::Office),
            _ => Err(()),
        }
    }
}

/// A join row granting one catalog entry to one user. `is_default` is only
/// meaningful for office assignments and stays false elsewhere.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_id: Uuid,
    pub kind: AssignmentKind,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    pub is_auto_assigned: bool,
    pub is_default: bool,
}

impl Loggable for UserAssignment {
    fn entity_type() -> &'static str { "assignment" }
    fn subject_id(&self) -> Uuid { self.user_id }
    fn severity(&self) -> Severity { Severity::Critical }
}
