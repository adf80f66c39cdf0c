//! API routes for the query server

pub mod documents;
pub mod ingest;
pub mod query;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query))
        .route("/ingest", post(ingest::ingest))
        .route("/documents", get(documents::list_documents))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "docrag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document Q&A with directory ingestion and cited answers",
        "endpoints": {
            "POST /api/query": "Ask a question (set stream=true for incremental fragments)",
            "POST /api/ingest": "Rebuild the index from the source directory",
            "GET /api/documents": "List the ingested corpus",
            "GET /api/files/data/*": "Source files referenced by citations",
        },
    }))
}
