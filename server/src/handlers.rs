//! Listing, voting and commenting. Thin wrappers over the store's atomic updates.

use tracing::{error, info};

use crate::error::IdeaError;
use crate::models::{required_text_field, Idea};
use crate::store::IdeaStore;

pub async fn list_ideas(store: &dyn IdeaStore) -> Result<Vec<Idea>, IdeaError> {
	store.list_all().await
}

pub async fn vote(store: &dyn IdeaStore, id: &str) -> Result<u64, IdeaError> {
	let votes = store.increment_vote(id).await.map_err(|err| {
		error!(%err, id, "vote failed");
		err
	})?;
	info!(id, votes, "vote recorded");
	Ok(votes)
}

/// Validates the raw `{"comment": ...}` body before touching the store.
pub async fn add_comment(store: &dyn IdeaStore, id: &str, raw_body: &[u8]) -> Result<usize, IdeaError> {
	let comment = required_text_field(raw_body, "comment")?;
	let count = store.append_comment(id, &comment).await.map_err(|err| {
		error!(%err, id, "comment failed");
		err
	})?;
	info!(id, count, "comment added");
	Ok(count)
}
