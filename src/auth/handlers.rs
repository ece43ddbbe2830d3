use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, LogoutResponse, PublicUser, SignupRequest},
        extractors::CurrentSession,
        repo_types::User,
        transport::{CookieTransport, TokenTransport},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

/// Trimmed email and raw password, both required.
fn credentials<'a>(
    email: &'a Option<String>,
    password: &'a Option<String>,
) -> AppResult<(&'a str, &'a str)> {
    let email = email.as_deref().map(str::trim).unwrap_or_default();
    let password = password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        warn!("missing email or password");
        return Err(AppError::validation("email and password are required"));
    }
    Ok((email, password))
}

/// Mint a session for `user` and put it on the response.
async fn start_session(
    state: &AppState,
    user: User,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let token = state.sessions.issue(user.id, &user.email).await?;
    let mut transport = CookieTransport::outbound(&state.cookie);
    transport.attach_token(&token);

    Ok((
        transport.into_headers(),
        Json(AuthResponse {
            success: true,
            user: PublicUser {
                id: user.id,
                email: user.email,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let (email, password) = credentials(&payload.email, &payload.password)?;

    // UTF-16 units, matching how browsers measure the same input
    if password.encode_utf16().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if payload.confirm_password.as_deref() != Some(password) {
        warn!("password confirmation mismatch");
        return Err(AppError::validation("passwords do not match"));
    }

    let user = state.auth.signup(email, password).await?;
    start_session(&state, user).await
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let (email, password) = credentials(&payload.email, &payload.password)?;

    let user = state.auth.login(email, password).await?;
    start_session(&state, user).await
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<(HeaderMap, Json<LogoutResponse>)> {
    let mut transport = CookieTransport::new(&state.cookie, &headers);
    state.sessions.destroy(&mut transport).await?;
    Ok((transport.into_headers(), Json(LogoutResponse { success: true })))
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<User>> {
    match state.auth.get_user_by_id(session.user_id).await? {
        Some(user) => Ok(Json(user)),
        None => {
            warn!(user_id = session.user_id, "session refers to a missing user");
            Err(AppError::Unauthorized)
        }
    }
}
