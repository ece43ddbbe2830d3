use std::sync::Arc;

use rand::{rngs::OsRng, RngCore};
use tracing::{debug, info, instrument};

use crate::auth::{repo::SessionStore, repo_types::Session, transport::TokenTransport};

/// Random bytes per token; hex-encoded to 64 characters.
pub const TOKEN_BYTES: usize = 32;

pub fn generate_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Issues, resolves and destroys opaque session tokens. Sessions have no
/// server-side expiry; a token is valid until it is destroyed.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, email))]
    pub async fn issue(&self, user_id: i64, email: &str) -> anyhow::Result<String> {
        let token = generate_token();
        self.store.insert_session(&token, user_id, email).await?;
        info!(user_id, "session issued");
        Ok(token)
    }

    pub async fn resolve(&self, token: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.store.find_session(token).await?)
    }

    pub async fn current_session<T>(&self, transport: &T) -> anyhow::Result<Option<Session>>
    where
        T: TokenTransport + ?Sized,
    {
        let Some(token) = transport.read_token() else {
            debug!("no session token presented");
            return Ok(None);
        };
        self.resolve(&token).await
    }

    #[instrument(skip_all)]
    pub async fn destroy<T>(&self, transport: &mut T) -> anyhow::Result<()>
    where
        T: TokenTransport + ?Sized,
    {
        if let Some(token) = transport.read_token() {
            self.store.delete_session(&token).await?;
            info!("session destroyed");
        }
        transport.clear_token();
        Ok(())
    }
}
