//! Backend for the GUGNAG novelty site.
//!
//! Every editable region of the page is a row in SQLite. The Text API
//! commits writes (current value + append-only history) and the fan-out
//! channel pushes each committed write to every connected browser tab over
//! a WebSocket. [`sync_agent`] holds the client-side state machine that
//! drives click-to-edit, auto-revert and live updates; it is embeddable and
//! fully testable without a browser.

pub mod app;
pub mod config;
pub mod defaults;
pub mod errors;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod sync_agent;

use std::path::PathBuf;

use axum::serve;
use tokio::net::TcpListener;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;
use crate::services::broadcast_service::UpdateBroadcaster;
use crate::state::app::AppState;
use crate::store::TextStore;

pub async fn start_server() {
    //
    // ────────────────────────────────────────────────────────
    //  Locate config.json (EXE folder or project root)
    // ────────────────────────────────────────────────────────
    //
    let exe_path = std::env::current_exe().expect("Cannot get executable path");
    let exe_dir = exe_path.parent().expect("Cannot get executable directory");

    let mut config_path: PathBuf = exe_dir.join("config.json");

    if !config_path.exists() {
        let fallback = exe_dir.join("..").join("config.json");
        if fallback.exists() {
            config_path = fallback;
        } else {
            panic!(
                "config.json not found in:\n  {}\n  {}\nCopy config.json to one of these paths.",
                exe_dir.join("config.json").display(),
                fallback.display()
            );
        }
    }

    //
    // ────────────────────────────────────────────────────────
    //  Load configuration and configure logging
    // ────────────────────────────────────────────────────────
    //
    let cfg = AppConfig::load_from_file(config_path.to_str().unwrap());

    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info"  => LevelFilter::INFO,
        "warn"  => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    tracing::info!("Starting gugnag-server…");
    tracing::info!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Open the text store (seeds defaults on first boot)
    // ────────────────────────────────────────────────────────
    //
    let store = TextStore::open(&cfg.database_path).expect("Failed to open text store");
    let updates = UpdateBroadcaster::new(cfg.channel_capacity);
    let state = AppState::new(store, updates, cfg.clone());

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app and start listening
    // ────────────────────────────────────────────────────────
    //
    let app = app::build_app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await
        .expect("Server error");
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");

    tracing::warn!("CTRL+C received — shutting down. Goodbye.");
}
