//! HTTP surface: auth, session middleware, thumbnail endpoints.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod router;
pub mod session;
pub mod state;
pub mod thumbnails;

pub use router::router;
pub use state::{AppState, AppStateInner};
