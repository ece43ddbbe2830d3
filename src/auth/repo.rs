use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::repo_types::{Session, UserRecord};

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::UniqueViolation;
            }
        }
        StoreError::Backend(anyhow::Error::new(err))
    }
}

/// Persistence for user records. Email uniqueness is enforced here.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with [`StoreError::UniqueViolation`] when the email is taken.
    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;
}

/// Persistence for session tokens. The token is the primary key.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(
        &self,
        token: &str,
        user_id: i64,
        email: &str,
    ) -> Result<(), StoreError>;
    async fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError>;
    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO nextbi.users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, name, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, name, created_at, updated_at
            FROM nextbi.users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, name, created_at, updated_at
            FROM nextbi.users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(
        &self,
        token: &str,
        user_id: i64,
        email: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO nextbi.sessions (token, user_id, email)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(email)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT user_id, email, created_at
            FROM nextbi.sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM nextbi.sessions WHERE token = $1")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
