//! API Server for Sitesmith
//!
//! Binds the agent loop to browser clients: one WebSocket connection per
//! client, one run in flight per connection.

mod routes;
mod state;
mod ws;

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitesmith_core::config::Config;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_server=debug,agent_loop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        "Using model {} with output directory {:?}",
        config.model,
        config.output_dir
    );

    // The output directory must exist before the first run
    agent_loop::ensure_dir(&config.output_dir)
        .await
        .expect("Failed to create output directory");

    let app_state = AppState::new(config.clone());

    let app = Router::new()
        .merge(routes::health::router())
        .route("/ws", get(ws::agent_ws_handler))
        .with_state(app_state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
