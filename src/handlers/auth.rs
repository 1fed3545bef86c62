use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    Extension,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{info, warn};

use crate::db::users::{self, CurrentUser};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{session_token, SESSION_COOKIE};
use crate::models::{AuthResponse, CredentialsRequest};
use crate::state::AppState;

/// Browser-session cookie; expiry is enforced server side.
fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let username = req.username.trim();
    users::validate_credentials(username, &req.password).map_err(AppError::validation)?;

    let user = users::create_user(&state.db, username, &req.password).await?;
    info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            username: user.username,
            token: None,
            expires_at: None,
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CredentialsRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let username = req.username.trim();
    let Some(user) = users::find_by_username(&state.db, username).await? else {
        warn!(username = %username, "Failed login attempt: unknown user");
        return Err(AppError::Unauthorized);
    };

    let password = req.password.clone();
    let stored = user.password_hash.clone();
    let verified =
        tokio::task::spawn_blocking(move || users::verify_password(&password, &stored)).await?;
    if !verified {
        warn!(username = %username, "Failed login attempt");
        return Err(AppError::Unauthorized);
    }

    let removed = users::delete_expired_sessions(&state.db, &user.id).await?;
    let ttl_hours = state.config.session_ttl_hours;
    let session = users::create_session(&state.db, &user.id, chrono::Duration::hours(ttl_hours)).await?;
    info!(user_id = %user.id, expired_sessions_removed = removed, "User logged in");

    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            username: user.username,
            token: Some(session.token),
            expires_at: Some(session.expires_at.to_rfc3339()),
        }),
    ))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(token) = session_token(&headers) {
        users::delete_session(&state.db, &token).await?;
    }
    info!(user_id = %user.id, "User logged out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok((jar, StatusCode::NO_CONTENT))
}
