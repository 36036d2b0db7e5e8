use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::events::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Office {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Office {
    fn entity_type() -> &'static str { "office" }
    fn subject_id(&self) -> Uuid { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OfficeCreateRequest {
    #[schema(example = "Headquarters")]
    pub title: String,
    #[schema(example = "Rotterdam")]
    pub city: Option<String>,
    #[schema(example = "Coolsingel 1")]
    pub address: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OfficeUpdateRequest {
    pub title: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub sort_order: Option<i64>,
}
