//! In-memory stores used by the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::auth::repo::{CredentialStore, SessionStore, StoreError};
use crate::auth::repo_types::{Session, UserRecord};

/// Holds users and sessions behind write locks so that uniqueness checks and
/// inserts happen atomically, like the unique constraints in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<UserRecord>>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation);
        }
        let now = OffsetDateTime::now_utc();
        let record = UserRecord {
            id: users.len() as i64 + 1,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: String::new(),
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(
        &self,
        token: &str,
        user_id: i64,
        email: &str,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(token) {
            return Err(StoreError::UniqueViolation);
        }
        sessions.insert(
            token.to_string(),
            Session {
                user_id,
                email: email.to_string(),
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

/// Store whose every call fails, for exercising the internal-error paths.
pub struct BrokenStore;

#[async_trait]
impl CredentialStore for BrokenStore {
    async fn insert_user(&self, _email: &str, _hash: &str) -> Result<UserRecord, StoreError> {
        Err(anyhow::anyhow!("database unavailable").into())
    }

    async fn find_user_by_email(&self, _email: &str) -> Result<Option<UserRecord>, StoreError> {
        Err(anyhow::anyhow!("database unavailable").into())
    }

    async fn find_user_by_id(&self, _id: i64) -> Result<Option<UserRecord>, StoreError> {
        Err(anyhow::anyhow!("database unavailable").into())
    }
}

#[async_trait]
impl SessionStore for BrokenStore {
    async fn insert_session(
        &self,
        _token: &str,
        _user_id: i64,
        _email: &str,
    ) -> Result<(), StoreError> {
        Err(anyhow::anyhow!("database unavailable").into())
    }

    async fn find_session(&self, _token: &str) -> Result<Option<Session>, StoreError> {
        Err(anyhow::anyhow!("database unavailable").into())
    }

    async fn delete_session(&self, _token: &str) -> Result<(), StoreError> {
        Err(anyhow::anyhow!("database unavailable").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_unique_violation() {
        let store = MemoryStore::new();
        let first = store.insert_user("a@x.test", "hash-1").await.unwrap();
        let err = store.insert_user("a@x.test", "hash-2").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));

        let kept = store.find_user_by_email("a@x.test").await.unwrap().unwrap();
        assert_eq!(kept.id, first.id);
        assert_eq!(kept.password_hash, "hash-1");
    }

    #[tokio::test]
    async fn email_match_is_case_sensitive() {
        let store = MemoryStore::new();
        store.insert_user("A@x.test", "h").await.unwrap();
        assert!(store.insert_user("a@x.test", "h").await.is_ok());
        assert!(store.find_user_by_email("A@X.TEST").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_token_is_unique_violation() {
        let store = MemoryStore::new();
        store.insert_session("tok", 1, "a@x.test").await.unwrap();
        let err = store.insert_session("tok", 2, "b@x.test").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
        assert_eq!(store.find_session("tok").await.unwrap().unwrap().user_id, 1);
    }
}
