use anyhow::Context;
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{AuthStatusResponse, CredentialsRequest, MessageResponse, User};
use crate::routes::error::ApiError;
use crate::services::auth::{hash_password, verify_password};
use crate::AppState;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "sid";

/// Authenticated caller, resolved from the session cookie
pub struct AuthUser(pub Uuid);

fn session_token(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&jar).ok_or(ApiError::Unauthorized)?;

        state
            .sessions
            .find_user(token)
            .await?
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

fn session_cookie(token: Uuid, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Open a session for the user and attach its cookie
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user_id: Uuid,
) -> Result<CookieJar, ApiError> {
    let session = state.sessions.create(user_id).await?;
    Ok(jar.add(session_cookie(session.token, state.config.secure_cookies())))
}

/// POST /api/register - Create an account and log it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    if state.users.find_by_username(&payload.username).await?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")?;

    let user = state
        .users
        .create(User::new(payload.username, password_hash))
        .await?;
    let jar = start_session(&state, jar, user.id).await?;

    tracing::info!("User registered: {}", user.username);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(MessageResponse::new("User registered")),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid username or password".to_string());

    let user = state
        .users
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(invalid)?;

    let encoded = user.password_hash.clone();
    let password = payload.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&encoded, &password))
        .await
        .context("Password verification task failed")?;

    if !valid {
        tracing::warn!("Failed login for {}", user.username);
        return Err(invalid());
    }

    let jar = start_session(&state, jar, user.id).await?;
    tracing::info!("User logged in: {}", user.username);

    Ok((jar, Json(MessageResponse::new("Logged in"))))
}

/// GET /api/check-auth
pub async fn check_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<AuthStatusResponse>, ApiError> {
    let user = match session_token(&jar) {
        Some(token) => match state.sessions.find_user(token).await? {
            Some(user_id) => state.users.find_by_id(user_id).await?,
            None => None,
        },
        None => None,
    };

    Ok(Json(AuthStatusResponse {
        authenticated: user.is_some(),
        username: user.map(|u| u.username),
    }))
}

/// POST /api/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&jar) {
        state.sessions.delete(token).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(MessageResponse::new("Logged out"))))
}
