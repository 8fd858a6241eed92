//! Vox server binary: the entry point for Vox Studio.
//!
//! Starts an axum HTTP server with structured logging, profile storage
//! initialization, and graceful shutdown on SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use vox_engine::{ModelManager, RunnerBackend};
use vox_profiles::ProfileStore;
use vox_server::{app, config, AppState};

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("VOX_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

/// Drops a placeholder UI shell in place when none is bundled, so a fresh
/// checkout still serves something at `/`.
fn ensure_ui_shell(static_dir: &std::path::Path) -> std::io::Result<()> {
    std::fs::create_dir_all(static_dir)?;
    let index = static_dir.join("index.html");
    if !index.exists() {
        std::fs::write(
            &index,
            "<html><body><h1>Vox Studio Placeholder</h1></body></html>",
        )?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize storage
    std::fs::create_dir_all(&config.storage.data_dir)
        .expect("failed to create data directory; check storage.data_dir in config");
    ensure_ui_shell(&config.storage.static_dir)
        .expect("failed to prepare static directory; check storage.static_dir in config");

    let profiles = ProfileStore::open(&config.storage.data_dir, &config.storage.static_dir)
        .expect("failed to open the profile store; check storage.data_dir in config");

    // Model backend
    let backend = RunnerBackend::new(&config.engine.runner);
    let manager = Arc::new(ModelManager::new(Arc::new(backend)));

    let http = reqwest::Client::builder()
        .user_agent(concat!("voxstudio/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build HTTP client");

    // Build application
    let state = AppState {
        manager: manager.clone(),
        profiles: Arc::new(profiles),
        ffmpeg: config.audio.ffmpeg.clone(),
        static_dir: config.storage.static_dir.clone(),
        update_repo: config.update.repo.clone(),
        http,
    };

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting vox server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("shutting down, clearing the loaded model");
    manager.release();

    tracing::info!("vox server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
