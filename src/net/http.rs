use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::Registry;
use crate::error::{AppResult, InfraError};
use crate::net::{AppCtx, api, play};

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/players", get(api::available_players))
        .route("/players/register", post(api::register))
        .route("/players/login", post(api::login))
        .route("/players/refresh_token", post(api::refresh_token))
        .route("/players/{name}/stats", get(api::stats))
        .route("/games", get(api::active_games))
        .route("/games/create", post(api::create_game))
        .route("/games/{game_id}/play", get(play::play_upgrade))
        .with_state(AppCtx { registry })
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

/// Run the HTTP server with the lobby routes and the game WebSocket endpoint
pub async fn serve(addr: &str, registry: Arc<Registry>) -> AppResult<()> {
    let listener = TcpListener::bind(addr).await.map_err(InfraError::from)?;
    tracing::info!(addr = %addr, "http listening");
    serve_listener(listener, registry).await
}

/// Serves on an already bound listener.
pub async fn serve_listener(listener: TcpListener, registry: Arc<Registry>) -> AppResult<()> {
    axum::serve(listener, router(registry)).await.map_err(InfraError::from)?;
    Ok(())
}
