//! Re-ingestion endpoint

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::Result;
use crate::index::persistence;
use crate::ingestion::IngestPipeline;
use crate::server::state::AppState;
use crate::types::response::IngestReport;

/// POST /api/ingest - rebuild the index from the configured source
/// directory, persist it, and publish it.
///
/// Queries running concurrently keep the snapshot they started with; the
/// new index becomes visible atomically once the rebuild completes.
pub async fn ingest(State(state): State<AppState>) -> Result<Json<IngestReport>> {
    let config = state.config();
    tracing::info!(
        "Re-ingesting {}",
        config.ingestion.source_dir.display()
    );

    let pipeline = IngestPipeline::new(Arc::clone(state.embedder()), &config.chunking);
    let outcome = pipeline.run(&config.ingestion.source_dir).await?;

    persistence::save(&outcome.index, &config.ingestion.index_path)?;
    state.publish_index(outcome.index);

    Ok(Json(outcome.report))
}
