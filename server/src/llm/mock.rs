//! Mock backend for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::traits::*;

/// Scripted backend. Answers are consumed in order; once one remains it repeats.
pub struct MockBackend {
    model_id: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            model_id: "mock-model".to_string(),
            script: Mutex::new(VecDeque::from(vec![Ok("Mock response".to_string())])),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Always answer with `content`.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.with_script(vec![Ok(content.into())])
    }

    /// Always fail with `err`.
    pub fn failing(self, err: LlmError) -> Self {
        self.with_script(vec![Err(err)])
    }

    pub fn with_script(mut self, script: Vec<Result<String, LlmError>>) -> Self {
        self.script = Mutex::new(script.into());
        self
    }

    /// Number of times `complete` was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request);
        }
        let next = {
            let mut script = self
                .script
                .lock()
                .map_err(|_| LlmError::Unavailable("mock script poisoned".to_string()))?;
            if script.len() > 1 { script.pop_front() } else { script.front().cloned() }
        };
        match next {
            Some(Ok(content)) => Ok(CompletionResponse::new(content)),
            Some(Err(err)) => Err(err),
            None => Err(LlmError::Unavailable("mock script empty".to_string())),
        }
    }
}
