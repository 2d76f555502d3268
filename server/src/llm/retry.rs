//! Bounded retry with exponential backoff around any backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::traits::*;

pub struct RetryingBackend {
    inner: Arc<dyn LlmBackend>,
    max_retries: u32,
    backoff: Duration,
}

impl RetryingBackend {
    pub fn new(inner: Arc<dyn LlmBackend>, max_retries: u32, backoff: Duration) -> Self {
        Self { inner, max_retries, backoff }
    }
}

#[async_trait]
impl LlmBackend for RetryingBackend {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut attempt = 0u32;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(resp) => return Ok(resp),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    warn!(%err, attempt, delay_ms = delay.as_millis() as u64, "text generation failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
