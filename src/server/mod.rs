pub mod handlers;
pub mod state;

use crate::config::Config;
use axum::{Router, routing::get};
use state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Build the router with all routes and the permissive CORS layer.
///
/// Exposed separately from [`start`] so tests can drive the router without
/// binding a listener.
pub fn build_router(config: Config) -> Router {
    let state = AppState::new(config);

    Router::new()
        .route("/", get(handlers::usage))
        .route("/health", get(handlers::health))
        .route("/playlist.m3u8", get(handlers::playlist::serve_playlist))
        .route("/{*path}", get(handlers::resource::serve_resource))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);

    let app = build_router(config);

    // Bind TCP listener
    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("Server listening on http://{}", addr);

    // Start serving
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
