//! Ingestion binary, run out-of-band before (or alongside) query serving
//!
//! Run with: cargo run --bin docrag-ingest [config.toml]

use std::path::PathBuf;
use std::sync::Arc;

use docrag::config::RagConfig;
use docrag::ingestion::IngestPipeline;
use docrag::providers::OpenAiClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docrag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("docrag.toml"));
    let config = RagConfig::load_or_default(&config_path)?;

    tracing::info!(
        "Ingesting {} into {}",
        config.ingestion.source_dir.display(),
        config.ingestion.index_path.display()
    );

    let client = Arc::new(OpenAiClient::new(&config.provider)?);
    let pipeline = IngestPipeline::new(client, &config.chunking);

    let outcome = pipeline
        .run_and_save(&config.ingestion.source_dir, &config.ingestion.index_path)
        .await?;

    println!(
        "Ingested {} documents ({} chunks) in {}ms",
        outcome.report.documents.len(),
        outcome.report.total_chunks,
        outcome.report.processing_time_ms
    );
    for doc in &outcome.report.documents {
        println!("  {} ({} chunks)", doc.filename, doc.total_chunks);
    }
    for err in &outcome.report.errors {
        eprintln!("  FAILED {}: {}", err.filename, err.error);
    }

    if outcome.report.documents.is_empty() && !outcome.report.errors.is_empty() {
        anyhow::bail!("ingestion failed for every file");
    }

    Ok(())
}
