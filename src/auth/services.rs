use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::auth::{
    password::Hasher,
    repo::{CredentialStore, StoreError},
    repo_types::User,
};

/// Domain errors of signup/login. Anything that is not a domain error is
/// carried as `Internal` and must be surfaced as a generic failure.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    EmailExists,

    // same message for unknown email and wrong password
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailExists => "EMAIL_EXISTS",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend(e) => AuthError::Internal(e),
            other => AuthError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Signup, login and identity lookup over a [`CredentialStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Hasher,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Hasher) -> Self {
        Self { store, hasher }
    }

    /// Expects input already validated by the caller (non-empty, length, confirmation).
    #[instrument(skip(self, password))]
    pub async fn signup(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let hash = self.hasher.hash(password)?;

        match self.store.insert_user(email, &hash).await {
            Ok(record) => {
                info!(user_id = record.id, "user registered");
                Ok(record.into())
            }
            Err(StoreError::UniqueViolation) => {
                warn!("email already registered");
                Err(AuthError::EmailExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Some(record) = self.store.find_user_by_email(email).await? else {
            warn!("login unknown email");
            self.hasher.verify_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &record.password_hash)? {
            warn!(user_id = record.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = record.id, "user logged in");
        Ok(record.into())
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let record = self.store.find_user_by_id(id).await?;
        Ok(record.map(User::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        memory::{BrokenStore, MemoryStore},
        password::cheap_config,
    };

    fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let hasher = Hasher::new(&cheap_config()).unwrap();
        (AuthService::new(store.clone(), hasher), store)
    }

    #[tokio::test]
    async fn signup_then_login_returns_same_user() {
        let (svc, _) = service();
        let created = svc.signup("a@x.test", "password123").await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.email, "a@x.test");
        assert_eq!(created.name, "");

        let logged_in = svc.login("a@x.test", "password123").await.unwrap();
        assert_eq!(logged_in, created);
    }

    #[tokio::test]
    async fn duplicate_signup_is_email_exists_and_keeps_first_user() {
        let (svc, store) = service();
        let first = svc.signup("a@x.test", "password123").await.unwrap();

        let err = svc.signup("a@x.test", "other1234").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailExists));
        assert_eq!(err.code(), "EMAIL_EXISTS");

        let stored = store.find_user_by_email("a@x.test").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert!(svc.login("a@x.test", "password123").await.is_ok());
        assert!(svc.login("a@x.test", "other1234").await.is_err());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let (svc, _) = service();
        svc.signup("a@x.test", "password123").await.unwrap();

        let wrong = svc.login("a@x.test", "wrong1234").await.unwrap_err();
        let ghost = svc.login("ghost@x.test", "whatever").await.unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(ghost, AuthError::InvalidCredentials));
        assert_eq!(wrong.code(), ghost.code());
        assert_eq!(wrong.to_string(), ghost.to_string());
    }

    #[tokio::test]
    async fn stored_password_is_hashed() {
        let (svc, store) = service();
        svc.signup("hash@x.test", "plaintext123").await.unwrap();

        let stored = store.find_user_by_email("hash@x.test").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "plaintext123");
        assert!(stored.password_hash.len() > 50);
    }

    #[tokio::test]
    async fn email_is_not_case_normalized() {
        let (svc, _) = service();
        svc.signup("Case@x.test", "password123").await.unwrap();
        assert!(svc.signup("case@x.test", "password123").await.is_ok());

        let err = svc.login("CASE@x.test", "password123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn get_user_by_id_returns_none_for_unknown_id() {
        let (svc, _) = service();
        let created = svc.signup("id@x.test", "password123").await.unwrap();

        let found = svc.get_user_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(svc.get_user_by_id(9_999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn scenario_from_signup_to_failed_logins() {
        let (svc, _) = service();
        let user = svc.signup("a@x.test", "password123").await.unwrap();
        assert!(user.id > 0);
        assert_eq!(
            svc.signup("a@x.test", "other1234").await.unwrap_err().code(),
            "EMAIL_EXISTS"
        );
        assert!(svc.login("a@x.test", "password123").await.is_ok());
        assert_eq!(
            svc.login("a@x.test", "wrong1234").await.unwrap_err().code(),
            "INVALID_CREDENTIALS"
        );
        assert_eq!(
            svc.login("ghost@x.test", "whatever").await.unwrap_err().code(),
            "INVALID_CREDENTIALS"
        );
    }

    #[tokio::test]
    async fn storage_failures_are_internal_errors() {
        let svc = AuthService::new(Arc::new(BrokenStore), Hasher::new(&cheap_config()).unwrap());

        let err = svc.signup("a@x.test", "password123").await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
        assert!(matches!(
            svc.login("a@x.test", "password123").await.unwrap_err(),
            AuthError::Internal(_)
        ));
        assert!(matches!(
            svc.get_user_by_id(1).await.unwrap_err(),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn messages_carry_no_secrets() {
        assert_eq!(AuthError::EmailExists.to_string(), "email already registered");
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid email or password"
        );
    }
}
