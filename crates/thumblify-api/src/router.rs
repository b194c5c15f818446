use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use crate::middleware::require_session;
use crate::state::AppState;
use crate::{auth, thumbnails};

/// JSON bodies are small; generation requests carry only text.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// All application routes with state applied. CORS, tracing and static
/// assets are layered on by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/thumbnail/generate", post(thumbnails::generate))
        .route("/api/thumbnail/delete/{id}", delete(thumbnails::delete))
        .route("/api/user/thumbnails", get(thumbnails::list))
        .route("/api/user/thumbnail/{id}", get(thumbnails::get))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

async fn root() -> &'static str {
    "Server is Live!"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
