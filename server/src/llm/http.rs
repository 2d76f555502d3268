//! HTTP text-generation backend.
//!
//! Speaks one of two wire formats:
//! - text completion: `POST {base}/model/{model}/invoke` with
//!   `{prompt, max_tokens_to_sample, temperature, top_p}`, answered by `{completion}`
//! - OpenAI-compatible chat: `POST {base}/chat/completions`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::*;
use crate::config::{ApiFormat, LlmConfig};

pub struct HttpBackend {
    client: Client,
    base_url: String,
    format: ApiFormat,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        format: ApiFormat,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Unavailable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            format,
            model: model.into(),
            api_key,
            timeout,
        })
    }

    pub fn from_config(cfg: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(cfg.base_url.clone(), cfg.api_format, cfg.model.clone(), cfg.api_key.clone(), cfg.timeout)
    }

    fn endpoint(&self) -> String {
        match self.format {
            ApiFormat::TextCompletion => format!("{}/model/{}/invoke", self.base_url, self.model),
            ApiFormat::OpenAiChat => format!("{}/chat/completions", self.base_url),
        }
    }

    fn body(&self, request: &CompletionRequest) -> Result<serde_json::Value, LlmError> {
        let body = match self.format {
            ApiFormat::TextCompletion => serde_json::to_value(TextCompletionRequest {
                prompt: format!("\n\nHuman: {}\n\nAssistant:", request.prompt),
                max_tokens_to_sample: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
            }),
            ApiFormat::OpenAiChat => serde_json::to_value(ChatRequest {
                model: self.model.clone(),
                messages: vec![ChatMessage { role: "user".to_string(), content: request.prompt.clone() }],
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                stream: false,
            }),
        };
        body.map_err(|e| LlmError::ParseError(e.to_string()))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout.as_millis() as u64)
        } else {
            LlmError::NetworkError(e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct TextCompletionRequest {
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct TextCompletionResponse {
    completion: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

#[async_trait]
impl LlmBackend for HttpBackend {
    fn id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut http_request = self.client.post(self.endpoint());
        if let Some(key) = &self.api_key {
            http_request = http_request.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = http_request
            .json(&self.body(&request)?)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited);
            }
            if status.as_u16() == 503 {
                return Err(LlmError::Unavailable(format!("HTTP {}", status)));
            }
            return Err(LlmError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        let raw = response.bytes().await.map_err(|e| self.map_transport_error(e))?;
        let content = match self.format {
            ApiFormat::TextCompletion => {
                serde_json::from_slice::<TextCompletionResponse>(&raw)
                    .map_err(|e| LlmError::ParseError(e.to_string()))?
                    .completion
            }
            ApiFormat::OpenAiChat => serde_json::from_slice::<ChatResponse>(&raw)
                .map_err(|e| LlmError::ParseError(e.to_string()))?
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| LlmError::ParseError("No content in response".to_string()))?,
        };
        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(CompletionResponse::new(content))
    }
}
