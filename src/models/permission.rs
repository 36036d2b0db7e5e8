use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PermissionCategory {
    pub id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for PermissionCategory {
    fn entity_type() -> &'static str { "permission_category" }
    fn subject_id(&self) -> Uuid { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

/// A feature-access switch. Same shape as a menu entry but gates behaviour
/// rather than navigation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PermissionItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for PermissionItem {
    fn entity_type() -> &'static str { "permission_item" }
    fn subject_id(&self) -> Uuid { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

/// The whole permissions catalog as served to the admin screen.
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionsCatalog {
    pub categories: Vec<PermissionCategory>,
    pub items: Vec<PermissionItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionCategoryCreateRequest {
    #[schema(example = "Invoicing")]
    pub title: String,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionItemCreateRequest {
    pub category_id: Uuid,
    #[schema(example = "invoice.approve")]
    pub title: String,
    pub sort_order: Option<i64>,
}
