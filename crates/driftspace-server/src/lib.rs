pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod relay;

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::relay::RoomRegistry;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub rooms: Arc<RoomRegistry>,
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    // Initialize database
    let db = Database::connect(&config.database_url).await?;

    // Run migrations
    db.migrate().await?;

    // Initialize the relay room registry
    let rooms = Arc::new(RoomRegistry::new());

    // Create application state
    let state = AppState { db, rooms };

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .merge(relay::ws::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
