pub mod assignment;
pub mod menu;
pub mod office;
pub mod permission;
pub mod session;
pub mod user;

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One entry of a bulk reorder request, shared by every catalog kind.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub sort_order: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderRequest {
    pub entries: Vec<ReorderEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleRequest {
    pub is_active: bool,
}
