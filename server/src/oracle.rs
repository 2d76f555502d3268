//! Similarity Oracle: asks a text-generation backend whether a new idea
//! repeats one already on the board.
//!
//! The backend is asked to answer with exactly `DUPLICATE: <id>` or `UNIQUE`.
//! Anything else, and any backend failure, counts as "not a duplicate" so a
//! flaky model never blocks a submission.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::llm::{CompletionRequest, LlmBackend};
use crate::models::IdeaRef;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DuplicateCheck {
	pub is_duplicate: bool,
	pub similar_id: Option<String>,
}

impl DuplicateCheck {
	pub fn unique() -> Self {
		Self::default()
	}

	pub fn duplicate_of(id: impl Into<String>) -> Self {
		Self { is_duplicate: true, similar_id: Some(id.into()) }
	}
}

#[async_trait]
pub trait SimilarityOracle: Send + Sync {
	/// Never fails: problems degrade to [`DuplicateCheck::unique`].
	async fn check_duplicate(&self, new_text: &str, existing: &[IdeaRef]) -> DuplicateCheck;
}

pub struct LlmSimilarityOracle {
	backend: Arc<dyn LlmBackend>,
}

impl LlmSimilarityOracle {
	pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
		Self { backend }
	}
}

#[async_trait]
impl SimilarityOracle for LlmSimilarityOracle {
	async fn check_duplicate(&self, new_text: &str, existing: &[IdeaRef]) -> DuplicateCheck {
		if existing.is_empty() {
			info!("no existing ideas to compare against");
			return DuplicateCheck::unique();
		}
		let prompt = match duplicate_prompt(new_text, existing) {
			Ok(p) => p,
			Err(err) => {
				error!(%err, "failed to render duplicate prompt");
				return DuplicateCheck::unique();
			}
		};
		let request = CompletionRequest::new(prompt).with_max_tokens(100).with_temperature(0.0).with_top_p(1.0);
		match self.backend.complete(request).await {
			Ok(resp) => {
				info!(output = %resp.content, "duplicate check output");
				parse_verdict(&resp.content).unwrap_or_else(|| {
					warn!(output = %resp.content, "unclassifiable duplicate check response");
					DuplicateCheck::unique()
				})
			}
			Err(err) => {
				error!(%err, backend = self.backend.id(), "duplicate check failed");
				DuplicateCheck::unique()
			}
		}
	}
}

pub fn duplicate_prompt(new_text: &str, existing: &[IdeaRef]) -> serde_json::Result<String> {
	let listing = serde_json::to_string_pretty(existing)?;
	Ok(format!(
		"Compare the following new idea with the list of existing ideas. Determine if the new idea is semantically similar to, or a duplicate of, any existing idea.

New idea: {new}

Existing ideas:
{listing}

Instructions:
1. Identify the core concept of the new idea.
2. Compare that core concept with each existing idea.
3. Treat ideas as duplicates when they share the same fundamental concept or goal, even if worded differently.
4. Ignore minor differences in phrasing or specific details when the main idea is the same.
5. If the new idea is a subset or superset of an existing idea, treat it as a duplicate.

If the new idea duplicates or closely matches an existing idea, respond with:
DUPLICATE: <id of the most similar existing idea>

If the new idea is unique, respond with:
UNIQUE

Give exactly one of these responses and nothing else.",
		new = serde_json::to_string(new_text)?,
		listing = listing,
	))
}

fn duplicate_re() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"^DUPLICATE:\s*([^\s:]+)").expect("static regex"))
}

/// `None` when the output matches neither accepted shape.
pub fn parse_verdict(output: &str) -> Option<DuplicateCheck> {
	let output = output.trim();
	if output == "UNIQUE" {
		return Some(DuplicateCheck::unique());
	}
	duplicate_re().captures(output).and_then(|c| c.get(1)).map(|m| DuplicateCheck::duplicate_of(m.as_str()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::llm::{LlmError, MockBackend};

	fn existing() -> Vec<IdeaRef> {
		vec![
			IdeaRef { id: "abc-123".into(), text: "build a recycling app".into() },
			IdeaRef { id: "def-456".into(), text: "bike to work week".into() },
		]
	}

	#[test]
	fn test_parse_verdict() {
		assert_eq!(parse_verdict("UNIQUE"), Some(DuplicateCheck::unique()));
		assert_eq!(parse_verdict("  UNIQUE \n"), Some(DuplicateCheck::unique()));
		assert_eq!(parse_verdict("DUPLICATE: abc-123"), Some(DuplicateCheck::duplicate_of("abc-123")));
		assert_eq!(parse_verdict("DUPLICATE:abc-123\n"), Some(DuplicateCheck::duplicate_of("abc-123")));
		assert_eq!(parse_verdict("DUPLICATE: abc-123\nIt is the same app."), Some(DuplicateCheck::duplicate_of("abc-123")));
		assert_eq!(parse_verdict("DUPLICATE:"), None);
		assert_eq!(parse_verdict("unique"), None);
		assert_eq!(parse_verdict("UNIQUE, nothing like it"), None);
		assert_eq!(parse_verdict("I think this is a DUPLICATE: abc-123"), None);
	}

	#[test]
	fn test_prompt_lists_candidates_and_quotes_new_idea() {
		let prompt = duplicate_prompt("a \"green\" app", &existing()).unwrap();
		assert!(prompt.contains(r#"New idea: "a \"green\" app""#));
		assert!(prompt.contains("\"id\": \"abc-123\""));
		assert!(prompt.contains("\"idea\": \"bike to work week\""));
		assert!(prompt.contains("DUPLICATE: <id of the most similar existing idea>"));
	}

	#[tokio::test]
	async fn test_empty_existing_skips_backend() {
		let mock = Arc::new(MockBackend::new().with_response("DUPLICATE: nope"));
		let oracle = LlmSimilarityOracle::new(mock.clone());
		assert_eq!(oracle.check_duplicate("anything", &[]).await, DuplicateCheck::unique());
		assert_eq!(mock.call_count(), 0);
	}

	#[tokio::test]
	async fn test_classification_is_deterministic() {
		let mock = Arc::new(MockBackend::new().with_response("DUPLICATE: abc-123"));
		let oracle = LlmSimilarityOracle::new(mock.clone());
		let out = oracle.check_duplicate("recycling app", &existing()).await;
		assert_eq!(out, DuplicateCheck::duplicate_of("abc-123"));
		let req = &mock.requests()[0];
		assert_eq!(req.temperature, 0.0);
		assert_eq!(req.top_p, 1.0);
		assert_eq!(req.max_tokens, 100);
	}

	#[tokio::test]
	async fn test_fail_open() {
		let garbled = LlmSimilarityOracle::new(Arc::new(MockBackend::new().with_response("Maybe? Hard to say.")));
		assert_eq!(garbled.check_duplicate("x", &existing()).await, DuplicateCheck::unique());

		let down = LlmSimilarityOracle::new(Arc::new(MockBackend::new().failing(LlmError::Timeout(15_000))));
		assert_eq!(down.check_duplicate("x", &existing()).await, DuplicateCheck::unique());
	}
}
