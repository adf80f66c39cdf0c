//! Provider abstractions for the external embedding and completion models
//!
//! The traits are the replaceable seam: any OpenAI-compatible endpoint
//! (OpenAI, Azure OpenAI deployments, Ollama's `/v1` surface) works through
//! [`openai::OpenAiClient`], and tests substitute in-process fakes.

pub mod chat;
pub mod embedding;
pub mod openai;

pub use chat::{ChatProvider, CompletionStream};
pub use embedding::EmbeddingProvider;
pub use openai::OpenAiClient;
