use std::sync::OnceLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use thumblify_pipeline::records::user_from_row;
use thumblify_types::api::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, VerifyResponse};
use thumblify_types::models::User;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiJson};
use crate::middleware::{CurrentUser, NOT_LOGGED_IN};
use crate::session::{hash_token, new_token};
use crate::state::{AppState, blocking};

const MIN_PASSWORD_LEN: usize = 6;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();
    let row = blocking(&state.db, move |db| {
        let id = user_id.to_string();
        if !db.create_user(&id, &name, &email, &password_hash, Utc::now())? {
            return Ok(None);
        }
        db.get_user_by_id(&id)
    })
    .await?
    .ok_or_else(|| ApiError::BadRequest("User already exists".into()))?;

    let user = user_from_row(row)?;
    let jar = start_session(&state, jar, user.id).await?;
    info!(user_id = %user.id, "User registered");

    Ok((
        jar,
        Json(AuthResponse {
            message: "Account created successfully".into(),
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let email = normalize_email(&req.email);
    let Some(row) = blocking(&state.db, move |db| db.get_user_by_email(&email)).await? else {
        // Same Argon2 cost as a real check, so timing does not reveal the email
        if let Some(hash) = dummy_hash().and_then(|h| PasswordHash::new(h).ok()) {
            let _ = Argon2::default().verify_password(req.password.as_bytes(), &hash);
        }
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
    };

    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored password hash unreadable: {}", e)))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::BadRequest(INVALID_CREDENTIALS.into()))?;

    let user = user_from_row(row)?;
    let jar = start_session(&state, jar, user.id).await?;
    info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        Json(AuthResponse {
            message: "Logged in successfully".into(),
            user,
        }),
    ))
}

/// Drop the session row, if any, and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    if let Some(cookie) = jar.get(&state.sessions.cookie_name) {
        let token_hash = hash_token(cookie.value());
        blocking(&state.db, move |db| db.delete_session(&token_hash)).await?;
    }
    let jar = jar.remove(state.sessions.removal());
    Ok((jar, Json(MessageResponse::new("Logged out successfully"))))
}

pub async fn verify(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let row = blocking(&state.db, move |db| db.get_user_by_id(&current.id.to_string()))
        .await?
        .ok_or_else(|| ApiError::Unauthorized(NOT_LOGGED_IN.into()))?;
    let user: User = user_from_row(row)?;
    Ok(Json(VerifyResponse { user }))
}

/// Hash checked against when the email is unknown.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(b"thumblify-dummy-password", &salt)
                .ok()
                .map(|h| h.to_string())
        })
        .as_deref()
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

async fn start_session(state: &AppState, jar: CookieJar, user_id: Uuid) -> Result<CookieJar, ApiError> {
    let token = new_token();
    let token_hash = hash_token(&token);
    let now = Utc::now();
    let expires_at = now + state.sessions.lifetime;
    blocking(&state.db, move |db| {
        db.create_session(&token_hash, &user_id.to_string(), now, expires_at)
    })
    .await?;
    Ok(jar.add(state.sessions.cookie(token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_hash_rejects_any_password() {
        let hash = PasswordHash::new(dummy_hash().unwrap()).unwrap();
        assert!(Argon2::default().verify_password(b"hunter22", &hash).is_err());
        assert_eq!(dummy_hash(), dummy_hash());
    }

    #[test]
    fn emails_are_case_insensitive() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
