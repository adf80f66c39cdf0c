//! Query endpoint with citations and optional streaming

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::TryStreamExt;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{query::QueryRequest, response::QueryResponse};

/// POST /api/query - answer a question over the indexed corpus.
///
/// With `stream: true` the response body is the answer as plain-text
/// fragments; otherwise a JSON [`QueryResponse`] with citations. Either way
/// the query runs against the index snapshot taken at request start.
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Response> {
    let start = Instant::now();
    tracing::info!("Query: \"{}\"", request.question);

    let index = state.index();

    if request.stream {
        let (stream, citations) = state.engine().answer_stream(&index, &request).await?;
        tracing::info!(
            "Streaming answer with {} citations",
            citations.len()
        );

        let body = Body::from_stream(stream.map_ok(axum::body::Bytes::from));
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .map_err(|e| Error::internal(e.to_string()))?;
        return Ok(response);
    }

    let outcome = state.engine().answer(&index, &request).await?;
    let processing_time_ms = start.elapsed().as_millis() as u64;

    let mut response = QueryResponse::new(outcome.answer, outcome.citations, processing_time_ms);
    if request.include_chunks {
        response.raw_chunks = Some(outcome.chunks);
    }

    tracing::info!(
        "Query completed in {}ms with {} citations",
        processing_time_ms,
        response.citations.len()
    );
    Ok(Json(response).into_response())
}
