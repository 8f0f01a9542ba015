//! Doccheck API Server - AI-backed document compliance checking
//!
//! Provides REST endpoints for:
//! - Document upload + compliance analysis
//! - AI-assisted document correction
//! - Corrected document download and session status

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod models;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("doccheck_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing doccheck API...");
    let state = Arc::new(AppState::from_env());

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Pipeline endpoints
        .route("/upload", post(handlers::upload))
        .route("/modify/:file_id", post(handlers::modify))
        .route("/download/:file_id", get(handlers::download))
        .route("/status/:file_id", get(handlers::status))
        // Multipart framing overhead on top of the 16 MiB file cap
        .layer(DefaultBodyLimit::max(doc_extract::MAX_UPLOAD_BYTES + 64 * 1024))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Parse bind address
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting doccheck API on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
