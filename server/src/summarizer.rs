use std::sync::Arc;

use tracing::{error, info};

use crate::llm::{CompletionRequest, LlmBackend};

/// Stored in place of a summary when generation fails.
pub const SUMMARY_FAILED: &str = "Error: Unable to generate summary";

pub struct Summarizer {
	backend: Arc<dyn LlmBackend>,
}

impl Summarizer {
	pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
		Self { backend }
	}

	/// One-sentence summary of `text`; [`SUMMARY_FAILED`] if the backend cannot produce one.
	pub async fn summarize(&self, text: &str) -> String {
		let prompt = format!("Summarize the following idea in one sentence: '{}'", text);
		let request = CompletionRequest::new(prompt).with_max_tokens(100).with_temperature(0.7).with_top_p(1.0);
		match self.backend.complete(request).await {
			Ok(resp) if !resp.content.is_empty() => {
				info!(summary = %resp.content, "generated summary");
				resp.content
			}
			Ok(_) => {
				error!(backend = self.backend.id(), "empty summary returned");
				SUMMARY_FAILED.to_string()
			}
			Err(err) => {
				error!(%err, backend = self.backend.id(), "summary generation failed");
				SUMMARY_FAILED.to_string()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::llm::{LlmError, MockBackend};

	#[tokio::test]
	async fn test_summary_uses_sampling() {
		let mock = Arc::new(MockBackend::new().with_response("  An app that rewards recycling.  "));
		let summarizer = Summarizer::new(mock.clone());
		assert_eq!(summarizer.summarize("build a recycling app").await, "An app that rewards recycling.");
		let req = &mock.requests()[0];
		assert!(req.temperature > 0.0);
		assert!(req.prompt.contains("'build a recycling app'"));
	}

	#[tokio::test]
	async fn test_failure_yields_sentinel() {
		let summarizer = Summarizer::new(Arc::new(MockBackend::new().failing(LlmError::ParseError("no completion".into()))));
		assert_eq!(summarizer.summarize("x").await, SUMMARY_FAILED);
		let summarizer = Summarizer::new(Arc::new(MockBackend::new().with_response("   ")));
		assert_eq!(summarizer.summarize("x").await, SUMMARY_FAILED);
	}
}
