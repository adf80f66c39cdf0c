//! Query engine: embed the question, retrieve, prompt, generate
//!
//! The engine owns no index; callers pass the current snapshot so that a
//! concurrent re-ingestion never changes what an in-flight query sees.

use std::sync::Arc;

use crate::config::{RagConfig, RetrievalConfig};
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::index::{SearchHit, VectorIndex};
use crate::providers::{ChatProvider, CompletionStream, EmbeddingProvider};
use crate::types::query::{ChatMessage, QueryRequest};
use crate::types::response::Citation;
use crate::types::Chunk;

/// Everything produced for one answered question
#[derive(Debug)]
pub struct QueryOutcome {
    /// Generated answer text
    pub answer: String,
    /// Citations for the retrieved chunks
    pub citations: Vec<Citation>,
    /// The retrieved chunks themselves
    pub chunks: Vec<Chunk>,
}

/// Retrieval-augmented query engine
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
    retrieval: RetrievalConfig,
    file_server_prefix: String,
}

impl QueryEngine {
    /// Create an engine from providers and configuration
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
        config: &RagConfig,
    ) -> Self {
        Self {
            embedder,
            chat,
            retrieval: config.retrieval.clone(),
            file_server_prefix: config.ingestion.file_server_url_prefix.clone(),
        }
    }

    /// Answer a question over the given index snapshot.
    ///
    /// An empty index is not an error: the completion still runs, with no
    /// retrieved context and an empty citation list. A failing embedding or
    /// completion call propagates instead of producing a fabricated answer.
    pub async fn answer(&self, index: &VectorIndex, request: &QueryRequest) -> Result<QueryOutcome> {
        let (messages, citations, chunks) = self.assemble(index, request).await?;
        let answer = self.chat.complete(&messages).await?;

        tracing::info!(
            "Answered \"{}\" with {} citations",
            request.question,
            citations.len()
        );
        Ok(QueryOutcome {
            answer,
            citations,
            chunks,
        })
    }

    /// Like [`answer`](Self::answer), but yields the answer as a stream of
    /// text fragments. Citations are available before the stream starts.
    pub async fn answer_stream(
        &self,
        index: &VectorIndex,
        request: &QueryRequest,
    ) -> Result<(CompletionStream, Vec<Citation>)> {
        let (messages, citations, _) = self.assemble(index, request).await?;
        let stream = self.chat.complete_stream(&messages).await?;
        Ok((stream, citations))
    }

    async fn assemble(
        &self,
        index: &VectorIndex,
        request: &QueryRequest,
    ) -> Result<(Vec<ChatMessage>, Vec<Citation>, Vec<Chunk>)> {
        let top_k = request.top_k.unwrap_or(self.retrieval.top_k);
        let hits = self.retrieve(index, &request.question, top_k).await?;

        let terms: Vec<&str> = request.question.split_whitespace().collect();
        let citations: Vec<Citation> = hits
            .iter()
            .map(|hit| {
                let mut citation = Citation::from_chunk(&hit.chunk, hit.similarity)
                    .with_source_url(&self.file_server_prefix);
                citation.highlight_terms(&terms);
                citation
            })
            .collect();

        let context = PromptBuilder::build_context(&hits);
        let messages = PromptBuilder::build_messages(
            &self.retrieval.system_prompt,
            &context,
            &request.history,
            &request.question,
        );
        let chunks = hits.into_iter().map(|hit| hit.chunk).collect();

        Ok((messages, citations, chunks))
    }

    async fn retrieve(
        &self,
        index: &VectorIndex,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        if index.is_empty() {
            tracing::debug!("Index is empty; answering without retrieved context");
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(question).await?;
        index.search(&query_vector, top_k)
    }
}
