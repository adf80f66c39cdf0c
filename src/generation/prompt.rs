//! Prompt templates for retrieval-grounded generation

use crate::index::SearchHit;
use crate::types::query::ChatMessage;

/// Prompt builder for grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build numbered context blocks from search results
    pub fn build_context(hits: &[SearchHit]) -> String {
        let mut context = String::new();

        for (i, hit) in hits.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n{}\n\n",
                i + 1,
                hit.chunk.source.format_citation(),
                hit.chunk.content
            ));
        }

        context
    }

    /// Assemble the message list for the completion call.
    ///
    /// The system message carries the configured prompt plus the retrieved
    /// context; prior turns follow, and the question is the final user
    /// message. With no retrieved context (empty index) the system message
    /// is the bare configured prompt, so the model can still answer from
    /// general knowledge.
    pub fn build_messages(
        system_prompt: &str,
        context: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Vec<ChatMessage> {
        let system = if context.trim().is_empty() {
            system_prompt.to_string()
        } else {
            format!(
                "{}\n\nContext information from the document corpus is below.\n\
                 ---------------------\n{}---------------------\n\
                 Answer the question using the context above.",
                system_prompt, context
            )
        };

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(question));
        messages
    }
}
