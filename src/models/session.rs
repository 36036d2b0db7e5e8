use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Admin listing row: session joined with the owning user's name and email.
/// The raw token is never persisted, only its SHA-256 digest, so the listing
/// cannot leak usable credentials.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub is_active: bool,
}

impl crate::events::Loggable for SessionWithUser {
    fn entity_type() -> &'static str { "session" }
    fn subject_id(&self) -> Uuid { self.id }
    fn severity(&self) -> crate::events::Severity { crate::events::Severity::Critical }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SessionListQuery {
    /// When true, only sessions whose `expires_at` is still in the future.
    #[serde(default)]
    pub only_active: bool,
}
