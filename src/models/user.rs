use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Well-known role names. Roles are stored as plain text on the user row;
/// anything that is not `admin` is treated as a regular user.
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const USER: &str = "user";
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub banned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl crate::events::Loggable for User {
    fn entity_type() -> &'static str { "user" }
    fn subject_id(&self) -> Uuid { self.id }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub banned: bool,
    pub ban_reason: Option<String>,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(value: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: value.id,
            name: value.name,
            email: value.email,
            role: value.role,
            banned: value.banned,
            ban_reason: value.ban_reason,
            two_factor_enabled: value.two_factor_enabled,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Row returned by the admin user listing: the user record joined with its
/// passkey presence flag.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminUserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub banned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
    pub two_factor_enabled: bool,
    pub has_passkey: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
