use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,              // trimmed, lower-cased
    pub password_hash: String,      // Argon2 PHC string, never leaves the server
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: OffsetDateTime, // join timestamp
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}
