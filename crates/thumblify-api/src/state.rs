use std::sync::Arc;

use thumblify_db::Database;
use thumblify_pipeline::ThumbnailService;
pub(crate) use thumblify_pipeline::blocking;

use crate::session::SessionConfig;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub thumbnails: ThumbnailService,
    pub sessions: SessionConfig,
}

impl AppStateInner {
    pub fn new(thumbnails: ThumbnailService, sessions: SessionConfig) -> AppState {
        Arc::new(Self {
            db: thumbnails.db().clone(),
            thumbnails,
            sessions,
        })
    }
}
