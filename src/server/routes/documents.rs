//! Corpus listing endpoint

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::response::DocumentListResponse;

/// GET /api/documents - list the documents in the current index
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let index = state.index();
    let documents = index.document_summaries();

    Json(DocumentListResponse {
        total_count: documents.len(),
        documents,
    })
}
