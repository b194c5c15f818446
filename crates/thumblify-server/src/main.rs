mod config;
mod maintenance;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use thumblify_api::AppStateInner;
use thumblify_api::session::SessionConfig;
use thumblify_db::Database;
use thumblify_pipeline::ThumbnailService;
use thumblify_pipeline::assets::{AssetStore, CloudinaryStore, LocalStore};
use thumblify_pipeline::model::{GeminiClient, ImageModel};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thumblify=debug,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);
    info!("Database: {}", config.db_path.display());

    // Asset store: Cloudinary when fully configured, local directory otherwise
    let mut local_asset_dir = None;
    let store: Arc<dyn AssetStore> = match &config.cloudinary {
        Some(cloudinary) => Arc::new(CloudinaryStore::new(cloudinary.clone())?),
        None => {
            warn!("Cloudinary not configured, storing thumbnails locally");
            let public_base = format!("{}/assets", config.public_url.trim_end_matches('/'));
            let store = LocalStore::new(config.asset_dir.clone(), public_base).await?;
            local_asset_dir = Some(store.dir().clone());
            Arc::new(store)
        }
    };
    info!("Asset backend: {}", store.backend_name());

    let model: Arc<dyn ImageModel> = Arc::new(GeminiClient::new(config.gemini.clone())?);
    info!("Image model: {}", config.gemini.model);

    let sessions = SessionConfig {
        lifetime: chrono::Duration::days(config.session_days),
        secure: config.secure_cookies,
        ..SessionConfig::default()
    };
    let state = AppStateInner::new(ThumbnailService::new(db, model, store), sessions);

    // Background maintenance
    tokio::spawn(maintenance::run_maintenance_loop(
        state.clone(),
        config.maintenance_interval,
        config.stale_generation_after,
    ));

    // CORS: the browser client sends the session cookie, so origins are explicit
    let origins = config
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect::<Vec<_>>();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let mut app = thumblify_api::router(state);
    if let Some(dir) = local_asset_dir {
        app = app.nest_service("/assets", ServeDir::new(dir));
    }
    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Thumblify server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
