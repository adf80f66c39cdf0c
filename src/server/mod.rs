//! HTTP server for the query service

pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::Result;
use state::AppState;

/// RAG HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a new server, loading the persisted index if present
    pub fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Build the router with all routes
    fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_check))
            .nest("/api", routes::api_routes())
            .with_state(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        // Serve the source files so citation links resolve
        let source_dir = &self.config.ingestion.source_dir;
        if source_dir.is_dir() {
            router = router.nest_service("/api/files/data", ServeDir::new(source_dir));
        } else {
            tracing::warn!(
                "Source directory {} does not exist; citation links will 404",
                source_dir.display()
            );
        }

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| crate::error::Error::Config(format!("invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| crate::error::Error::Config(format!("failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| crate::error::Error::Internal(format!("server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
