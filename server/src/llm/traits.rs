//! Core trait for text-generation backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error types for text-generation calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    /// Backend is not available
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with a non-success status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Rate limited by the backend
    #[error("Rate limited")]
    RateLimited,

    /// No answer within the configured timeout
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LlmError {
    /// Whether a second attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Unavailable(_) | LlmError::RateLimited | LlmError::Timeout(_) | LlmError::NetworkError(_)
        )
    }
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend identifier (model name).
    fn id(&self) -> &str;

    /// Generate a completion for a single prompt.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// A single-prompt completion request with sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 100,
            temperature: 1.0,
            top_p: 1.0,
        }
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp.clamp(0.0, 1.0);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p.clamp(0.0, 1.0);
        self
    }
}

/// Generated text, already trimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
}

impl CompletionResponse {
    pub fn new(content: impl AsRef<str>) -> Self {
        Self { content: content.as_ref().trim().to_string() }
    }
}
