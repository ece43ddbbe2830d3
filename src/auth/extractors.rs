use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use super::{repo_types::Session, transport::CookieTransport};
use crate::{error::AppError, state::AppState};

/// Route guard: resolves the caller's session or rejects with 401.
pub struct CurrentSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let transport = CookieTransport::new(&state.cookie, &parts.headers);
        match state.sessions.current_session(&transport).await? {
            Some(session) => Ok(CurrentSession(session)),
            None => {
                debug!("request without a valid session");
                Err(AppError::Unauthorized)
            }
        }
    }
}
