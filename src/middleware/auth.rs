use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use crate::db::users;
use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "formease_session";

/// Session token from the cookie, or from an `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Rejects requests without a live session and attaches the
/// [`users::CurrentUser`] to the request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    let Some(token) = session_token(request.headers()) else {
        warn!("Missing session for {} {}", method, path);
        return Err(AppError::Unauthorized);
    };

    let Some(user) = users::find_session_user(&state.db, &token).await? else {
        warn!("Unknown or expired session for {} {}", method, path);
        return Err(AppError::Unauthorized);
    };

    debug!(user_id = %user.id, "Authenticated {} {}", method, path);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
