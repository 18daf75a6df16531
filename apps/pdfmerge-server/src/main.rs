//! PDF Merge Server
//!
//! Accepts several PDFs in one multipart upload and answers with a single
//! PDF containing all of their pages, in upload order.
//!
//! ## Architecture
//!
//! The server is stateless: each request holds its uploads and the merged
//! document in memory and drops them once the response is written. The
//! merge itself lives in `pdfmerge-core`; this binary provides:
//!
//! - Configuration from CLI flags and environment
//! - CORS for browser clients on other origins
//! - Request body size limits
//! - Multipart extraction and the attachment response

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod error;

use api::{handle_health, handle_merge};
use config::{Args, ServerConfig};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Read-only after startup
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Build the router with all routes and middleware
pub fn app(state: AppState) -> Router {
    // The client and server may run on different origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/merge", post(handle_merge))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from(&args);
    config.validate()?;
    let addr = config.bind_addr()?;

    info!("Starting PDF merge server on {}", addr);
    info!(
        "Upload field: '{}', minimum files: {}, body limit: {} bytes",
        config.field_name, config.min_files, config.max_upload_bytes
    );

    let state = AppState::new(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("PDF Merger API running on http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
