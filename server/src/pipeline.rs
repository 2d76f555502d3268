//! Submission Pipeline.
//!
//! validate -> read existing ideas -> duplicate check -> new id -> summary ->
//! build record -> single `put`. The `put` is the only durable write, so a
//! failure anywhere before it leaves no trace.
//!
//! Two submissions of the same idea racing each other can both be judged
//! unique: each only sees ideas committed before its own read.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::IdeaError;
use crate::models::{required_text_field, Idea, SubmissionResult};
use crate::oracle::SimilarityOracle;
use crate::store::IdeaStore;
use crate::summarizer::Summarizer;

pub struct SubmissionPipeline {
	store: Arc<dyn IdeaStore>,
	oracle: Arc<dyn SimilarityOracle>,
	summarizer: Arc<Summarizer>,
}

impl SubmissionPipeline {
	pub fn new(store: Arc<dyn IdeaStore>, oracle: Arc<dyn SimilarityOracle>, summarizer: Arc<Summarizer>) -> Self {
		Self { store, oracle, summarizer }
	}

	pub async fn submit(&self, raw_body: &[u8]) -> Result<SubmissionResult, IdeaError> {
		let text = required_text_field(raw_body, "idea").map_err(|err| {
			error!(%err, "rejected idea submission");
			err
		})?;
		info!(chars = text.len(), "received new idea");

		let existing = match self.store.list_candidates().await {
			Ok(ideas) => ideas,
			Err(err) => {
				error!(%err, "couldn't read existing ideas, skipping duplicate check");
				Vec::new()
			}
		};
		info!(count = existing.len(), "fetched existing ideas");

		let verdict = self.oracle.check_duplicate(&text, &existing).await;
		info!(duplicate = verdict.is_duplicate, similar = ?verdict.similar_id, "duplicate check result");
		if let Some(similar) = verdict.similar_id.as_deref() {
			if !existing.iter().any(|e| e.id == similar) {
				info!(similar, "duplicate verdict names an id outside the compared set");
			}
		}

		let id = Uuid::new_v4().to_string();
		let summary = self.summarizer.summarize(&text).await;
		let duplicate_of = if verdict.is_duplicate { verdict.similar_id.clone() } else { None };
		let idea = Idea::new(id.clone(), text, summary, duplicate_of.clone());

		self.store.put(&idea).await?;
		info!(%id, "idea saved");

		Ok(SubmissionResult { id, duplicate: duplicate_of.is_some(), duplicate_of })
	}
}
