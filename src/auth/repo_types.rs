use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User row as stored, hash included. Never leaves the auth module.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Public view of a user, as returned by `/api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Session payload resolved from a token.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub created_at: OffsetDateTime,
}
