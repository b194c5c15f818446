use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::hash_token;
use crate::state::{AppState, blocking};

pub const NOT_LOGGED_IN: &str = "You are not logged in";

/// The signed-in user, inserted by [`require_session`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: Uuid,
}

/// Resolve the session cookie to a live session.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(&state.sessions.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized(NOT_LOGGED_IN.into()))?;

    let token_hash = hash_token(&token);
    let user_id = blocking(&state.db, move |db| db.get_session_user(&token_hash, Utc::now()))
        .await?
        .ok_or_else(|| ApiError::Unauthorized(NOT_LOGGED_IN.into()))?;

    let id: Uuid = user_id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("bad user id in session: {}", e)))?;

    req.extensions_mut().insert(CurrentUser { id });
    Ok(next.run(req).await)
}
