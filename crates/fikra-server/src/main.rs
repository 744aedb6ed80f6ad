mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use fikra_api::auth::{AppState, AppStateInner};
use fikra_api::middleware::SessionKeys;
use fikra_api::uploads::Uploads;
use fikra_db::Database;
use fikra_types::models::Role;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fikra=debug,fikra_api=debug,fikra_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and upload storage
    let db = Database::open(&config.db_path)?;
    let uploads = Uploads::new(config.upload_dir.clone()).await?;

    for username in &config.admins {
        if db.set_user_role(username, Role::Admin.as_str())? {
            info!("Granted admin role to {}", username);
        } else {
            warn!("FIKRA_ADMINS names unknown user {}", username);
        }
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        keys: SessionKeys::new(&config.session_secret, config.session_days),
        uploads,
        max_upload_bytes: config.max_upload_bytes,
    });

    let app = fikra_api::router(state)
        .nest_service("/static/images", ServeDir::new(&config.upload_dir))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Fikra listening on {}", addr);
    info!("Upload limit: {} bytes", config.max_upload_bytes);

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
