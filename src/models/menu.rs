use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::{Loggable, Severity};

/// Well-known menu types. A menu belongs to exactly one type; its items are
/// catalog entries of the corresponding kind.
pub mod menu_types {
    pub const GENERAL: &str = "general";
    pub const USER_ITEMS: &str = "user_items";
    pub const USER_SECTIONS: &str = "user_sections";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Menu {
    pub id: Uuid,
    pub title: String,
    pub menu_type: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Menu {
    fn entity_type() -> &'static str { "menu" }
    fn subject_id(&self) -> Uuid { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

/// A navigation entry belonging to a menu.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MenuItem {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for MenuItem {
    fn entity_type() -> &'static str { "menu_item" }
    fn subject_id(&self) -> Uuid { self.id }
}

/// Groups user-section items; an item is only effectively visible while its
/// category is active.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SectionCategory {
    pub id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for SectionCategory {
    fn entity_type() -> &'static str { "section_category" }
    fn subject_id(&self) -> Uuid { self.id }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SectionItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for SectionItem {
    fn entity_type() -> &'static str { "section_item" }
    fn subject_id(&self) -> Uuid { self.id }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuItemCreateRequest {
    pub menu_id: Uuid,
    #[schema(example = "Dashboard")]
    pub title: String,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SectionCategoryCreateRequest {
    #[schema(example = "Reports")]
    pub title: String,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SectionItemCreateRequest {
    pub category_id: Uuid,
    #[schema(example = "Quarterly overview")]
    pub title: String,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogEntryUpdateRequest {
    pub title: Option<String>,
    pub sort_order: Option<i64>,
}
