//! Query request types

use serde::{Deserialize, Serialize};

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message, as sent to the completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Query request for the question-answering endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Prior conversation turns, oldest first. Forwarded to the completion
    /// call for this request only; nothing is stored server-side.
    #[serde(default)]
    pub history: Vec<ChatMessage>,

    /// Number of chunks to retrieve (defaults to the configured value)
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Stream the answer as incremental text fragments
    #[serde(default)]
    pub stream: bool,

    /// Include the raw retrieved chunks in the response
    #[serde(default)]
    pub include_chunks: bool,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            history: Vec::new(),
            top_k: None,
            stream: false,
            include_chunks: false,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Attach prior conversation turns
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}
