//! OpenAI-compatible client for embeddings and chat completions
//!
//! Talks to any endpoint speaking the OpenAI REST shape (`/embeddings`,
//! `/chat/completions`): OpenAI itself, Azure OpenAI deployments, or a
//! local Ollama server's `/v1` surface. Transient failures (timeouts, 429,
//! 5xx, transport errors) are retried with bounded exponential backoff;
//! terminal failures propagate immediately.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::types::query::ChatMessage;

use super::chat::{ChatProvider, CompletionStream};
use super::embedding::EmbeddingProvider;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// OpenAI-compatible API client with automatic retry
pub struct OpenAiClient {
    /// HTTP client with the configured timeout
    client: Client,
    /// Configuration
    config: ProviderConfig,
    /// Request timeout, reported in timeout errors
    timeout: Duration,
    /// Delay before the first retry; doubles per attempt
    retry_delay: Duration,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
            timeout,
            retry_delay: RETRY_BASE_DELAY,
        })
    }

    /// Override the base retry delay (mainly for tests)
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Retry a request with exponential backoff.
    ///
    /// Only retryable errors are retried; terminal errors propagate on the
    /// first occurrence. Total attempts are bounded by `max_retries + 1`.
    async fn with_retries<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        let delay = self.retry_delay * 2u32.pow(attempt);
                        tracing::warn!(
                            "Provider request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.config.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::internal("retries exhausted without an error")))
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Http(e)
        }
    }

    /// Classify non-success statuses: 429 is rate limiting, everything else
    /// carries its status for the retryable/terminal split.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(message));
        }
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Generate embeddings for `texts`, splitting into requests of at most
    /// `batch_size` inputs. Output order matches input order.
    pub async fn embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            vectors.extend(self.embeddings_single_batch(batch).await?);
        }
        Ok(vectors)
    }

    async fn embeddings_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let model = self.config.embedding_model.clone();
        let api_key = self.config.api_key.clone();
        let client = self.client.clone();
        let texts = texts.to_vec();
        let expected_dims = self.config.embedding_dimensions;

        self.with_retries(|| {
            let url = url.clone();
            let model = model.clone();
            let api_key = api_key.clone();
            let client = client.clone();
            let texts = texts.clone();

            async move {
                let request = EmbeddingsRequest {
                    model: &model,
                    input: &texts,
                };

                let mut builder = client.post(&url).json(&request);
                if let Some(key) = &api_key {
                    builder = builder.bearer_auth(key);
                }

                let response = builder
                    .send()
                    .await
                    .map_err(|e| self.map_send_error(e))?;
                let response = Self::check_status(response).await?;

                let body: EmbeddingsResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::embedding(format!("bad embeddings response: {}", e)))?;

                if body.data.len() != texts.len() {
                    return Err(Error::embedding(format!(
                        "requested {} embeddings, got {}",
                        texts.len(),
                        body.data.len()
                    )));
                }

                let mut data = body.data;
                data.sort_by_key(|d| d.index);

                let mut vectors = Vec::with_capacity(data.len());
                for item in data {
                    if item.embedding.len() != expected_dims {
                        return Err(Error::DimensionMismatch {
                            expected: expected_dims,
                            actual: item.embedding.len(),
                        });
                    }
                    vectors.push(item.embedding);
                }
                Ok(vectors)
            }
        })
        .await
    }

    /// Generate a chat completion and return the full answer text
    pub async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let model = self.config.chat_model.clone();
        let api_key = self.config.api_key.clone();
        let client = self.client.clone();
        let messages = messages.to_vec();
        let temperature = self.config.temperature;
        let max_tokens = self.config.max_tokens;

        tracing::debug!("Requesting completion from model {}", model);

        self.with_retries(|| {
            let url = url.clone();
            let model = model.clone();
            let api_key = api_key.clone();
            let client = client.clone();
            let messages = messages.clone();

            async move {
                let request = CompletionRequest {
                    model: &model,
                    messages: &messages,
                    temperature,
                    max_tokens,
                    stream: false,
                };

                let mut builder = client.post(&url).json(&request);
                if let Some(key) = &api_key {
                    builder = builder.bearer_auth(key);
                }

                let response = builder
                    .send()
                    .await
                    .map_err(|e| self.map_send_error(e))?;
                let response = Self::check_status(response).await?;

                let body: CompletionResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::completion(format!("bad completion response: {}", e)))?;

                body.choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| Error::completion("response contained no answer text"))
            }
        })
        .await
    }

    /// Generate a streaming completion, yielding text fragments.
    ///
    /// The stream is not restartable; connection errors surface once and
    /// are not retried mid-answer.
    pub async fn chat_completion_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<CompletionStream> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = CompletionRequest {
            model: &self.config.chat_model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: true,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        // Parse the SSE body line by line; a data line may be split across
        // network chunks, so undecoded bytes stay buffered between polls.
        let stream = futures_util::stream::try_unfold(
            (response.bytes_stream(), String::new()),
            |(mut body, mut buffer)| async move {
                loop {
                    if let Some(pos) = buffer.find('\n') {
                        let line: String = buffer.drain(..=pos).collect();
                        let line = line.trim();
                        if !line.starts_with("data:") {
                            continue;
                        }
                        let payload = line["data:".len()..].trim();
                        if payload == "[DONE]" {
                            return Ok(None);
                        }
                        let chunk: StreamChunk = serde_json::from_str(payload)
                            .map_err(|e| Error::completion(format!("bad stream chunk: {}", e)))?;
                        if let Some(text) = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content)
                        {
                            if !text.is_empty() {
                                return Ok(Some((text, (body, buffer))));
                            }
                        }
                        continue;
                    }

                    match body.next().await {
                        Some(Ok(bytes)) => buffer.push_str(&String::from_utf8_lossy(&bytes)),
                        Some(Err(e)) => {
                            return Err(Error::completion(format!("stream error: {}", e)))
                        }
                        None => return Ok(None),
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embeddings(texts).await
    }

    fn dimensions(&self) -> usize {
        self.config.embedding_dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.chat_completion(messages).await
    }

    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream> {
        self.chat_completion_stream(messages).await
    }

    fn model(&self) -> &str {
        &self.config.chat_model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, dimensions: usize, batch_size: usize, max_retries: u32) -> OpenAiClient {
        let config = ProviderConfig {
            base_url: base_url.to_string(),
            embedding_dimensions: dimensions,
            batch_size,
            max_retries,
            timeout_secs: 5,
            ..ProviderConfig::default()
        };
        OpenAiClient::new(&config)
            .unwrap()
            .with_retry_delay(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn embeddings_preserve_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0, 0.0]},
                    {"index": 0, "embedding": [1.0, 0.0, 0.0]},
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 32, 0);
        let vectors = client
            .embeddings(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn embeddings_split_into_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 0, "embedding": [1.0, 0.0, 0.0]},
                    {"index": 1, "embedding": [0.0, 1.0, 0.0]},
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 2, 0);
        let texts: Vec<String> = (0..4).map(|i| format!("text {}", i)).collect();
        let vectors = client.embeddings(&texts).await.unwrap();

        assert_eq!(vectors.len(), 4);
        // 4 inputs at batch size 2 -> 2 requests
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_within_bound() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [1.0, 0.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 32, 2);
        let vectors = client.embeddings(&["hello".to_string()]).await.unwrap();

        assert_eq!(vectors.len(), 1);
        // Fails twice, succeeds on the third and final allowed attempt
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn terminal_failures_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 32, 3);
        let err = client.embeddings(&["hello".to_string()]).await.unwrap_err();

        assert!(matches!(err, Error::Api { status: 401, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_exhausted_surfaces_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 32, 1);
        let err = client.embeddings(&["hello".to_string()]).await.unwrap_err();

        assert!(matches!(err, Error::Api { status: 503, .. }));
        // Initial attempt plus one retry
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn wrong_dimensionality_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [1.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 32, 3);
        let err = client.embeddings(&["hello".to_string()]).await.unwrap_err();

        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completion_returns_answer_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "The answer is 42."}}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 32, 0);
        let answer = client
            .chat_completion(&[ChatMessage::user("What is the answer?")])
            .await
            .unwrap();

        assert_eq!(answer, "The answer is 42.");
    }

    #[tokio::test]
    async fn empty_completion_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 32, 0);
        let err = client
            .chat_completion(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Completion(_)));
    }

    #[tokio::test]
    async fn streaming_yields_fragments_in_order() {
        let server = MockServer::start().await;
        let sse_body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3, 32, 0);
        let stream = client
            .chat_completion_stream(&[ChatMessage::user("hi")])
            .await
            .unwrap();

        let fragments: Vec<String> = stream
            .map(|r| r.unwrap())
            .collect::<Vec<_>>()
            .await;

        assert_eq!(fragments, vec!["Hel", "lo", " world"]);
    }
}
