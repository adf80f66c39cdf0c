//! Chat completion provider trait

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::Result;
use crate::types::query::ChatMessage;

/// A finite, non-restartable stream of answer fragments
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for LLM answer generation
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a completion for the given messages and return the full text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Generate a completion, yielding text fragments as they arrive
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream>;

    /// The model being used
    fn model(&self) -> &str;

    /// Provider name for logging
    fn name(&self) -> &str;
}
