//! Query server binary
//!
//! Run with: cargo run --bin docrag-server [config.toml]

use std::path::PathBuf;

use docrag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docrag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("docrag.toml"));
    let config = RagConfig::load_or_default(&config_path)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Provider: {}", config.provider.base_url);
    tracing::info!("  - Chat model: {}", config.provider.chat_model);
    tracing::info!(
        "  - Embedding model: {} ({} dims)",
        config.provider.embedding_model,
        config.provider.embedding_dimensions
    );
    tracing::info!("  - Index: {}", config.ingestion.index_path.display());
    tracing::info!("  - Source dir: {}", config.ingestion.source_dir.display());

    let server = RagServer::new(config)?;

    println!("Server starting on http://{}", server.address());
    println!("  POST /api/query     - ask questions");
    println!("  POST /api/ingest    - rebuild the index");
    println!("  GET  /api/documents - list the corpus");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
