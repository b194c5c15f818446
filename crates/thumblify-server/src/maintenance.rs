use std::time::Duration;

use chrono::Utc;
use thumblify_api::AppState;
use tracing::{info, warn};

/// Background task that prunes expired sessions and removes thumbnails
/// stuck in generation for longer than `stale_after`.
pub async fn run_maintenance_loop(state: AppState, interval: Duration, stale_after: Duration) {
    let mut interval = tokio::time::interval(interval);

    loop {
        interval.tick().await;

        match run_once(&state, stale_after).await {
            Ok((sessions, thumbnails)) => {
                if sessions > 0 || thumbnails > 0 {
                    info!(
                        "Maintenance: pruned {} expired sessions, removed {} stale thumbnails",
                        sessions, thumbnails
                    );
                }
            }
            Err(e) => {
                warn!("Maintenance error: {:#}", e);
            }
        }
    }
}

pub async fn run_once(state: &AppState, stale_after: Duration) -> anyhow::Result<(usize, usize)> {
    let db = state.db.clone();
    let sessions = tokio::task::spawn_blocking(move || db.prune_expired_sessions(Utc::now())).await??;

    let stale_after = chrono::Duration::from_std(stale_after)?;
    let thumbnails = state.thumbnails.sweep_stale(stale_after).await?;

    Ok((sessions, thumbnails))
}
