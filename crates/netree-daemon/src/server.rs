//! Web server setup and routing

use anyhow::Result;
use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api;
use crate::state::AppState;

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/devices", get(api::get_tree).post(api::add_device))
        .route("/devices/list", get(api::list_devices))
        .route(
            "/devices/{id}",
            put(api::update_device)
                .delete(api::delete_device)
                .get(api::get_device),
        )
        .route("/traverse/{method}", get(api::traverse))
        .route("/search", get(api::search))
        // The front-end is served from another origin
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the web server
pub async fn run(state: Arc<AppState>, bind: &str) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}
