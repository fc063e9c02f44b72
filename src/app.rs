use axum::http::{header::CONTENT_TYPE, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::routes::{system_routes, text_routes, ws_routes};
use crate::state::app::AppState;

/// Build the complete Axum application:
/// - /api/text, /api/history  (Text API)
/// - /api/ws                  (live-update fan-out)
/// - /api/health, /api/version
///
/// `state` is cloned into each route group.
pub fn build_app(state: AppState) -> Router {
    // The page is served from anywhere and talks to us with plain JSON.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let api = text_routes::routes(state.clone())
        .merge(ws_routes::routes(state.clone()))
        .merge(system_routes::routes(state.config.clone()));

    Router::new()
        // /api/*
        .nest("/api", api)

        .layer(cors)

        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
