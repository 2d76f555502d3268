//! Idea Store Client.
//!
//! `IdeaStore` is the seam the pipeline and handlers talk to; `SledIdeaStore`
//! keeps one JSON record per idea in a sled tree keyed by idea id. Counter and
//! list updates go through `update_and_fetch`, which retries its own
//! compare-and-swap loop, so concurrent votes and comments never lose writes.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::IdeaError;
use crate::models::{Idea, IdeaRef};

const SAVE_FAILED: &str = "Failed to save idea";
const READ_FAILED: &str = "Failed to read ideas";
const UPDATE_FAILED: &str = "Failed to update idea";
const NOT_FOUND: &str = "Idea not found";

#[async_trait]
pub trait IdeaStore: Send + Sync {
	/// Every stored idea, full projection.
	async fn list_all(&self) -> Result<Vec<Idea>, IdeaError>;

	/// `{id, idea}` projection of every stored idea.
	async fn list_candidates(&self) -> Result<Vec<IdeaRef>, IdeaError> {
		Ok(self.list_all().await?.iter().map(IdeaRef::from).collect())
	}

	async fn get(&self, id: &str) -> Result<Option<Idea>, IdeaError>;

	/// Insert a fresh record. Never replaces an existing id.
	async fn put(&self, idea: &Idea) -> Result<(), IdeaError>;

	/// Add one vote, returning the new count.
	async fn increment_vote(&self, id: &str) -> Result<u64, IdeaError>;

	/// Append a comment, returning the new number of comments.
	async fn append_comment(&self, id: &str, comment: &str) -> Result<usize, IdeaError>;
}

pub struct SledIdeaStore {
	db: sled::Db,
	tree: sled::Tree,
}

impl SledIdeaStore {
	pub fn open(data_dir: impl AsRef<Path>, tree_name: &str) -> anyhow::Result<Self> {
		let root = data_dir.as_ref();
		std::fs::create_dir_all(root)?;
		let db = sled::open(root.join("kv"))?;
		Self::from_db(db, tree_name)
	}

	pub fn from_db(db: sled::Db, tree_name: &str) -> anyhow::Result<Self> {
		let tree = db.open_tree(tree_name)?;
		Ok(Self { db, tree })
	}

	/// In-memory database removed on drop.
	pub fn temporary(tree_name: &str) -> anyhow::Result<Self> {
		let db = sled::Config::new().temporary(true).open()?;
		Self::from_db(db, tree_name)
	}

	pub async fn flush(&self) -> Result<(), IdeaError> {
		self.db.flush_async().await.map(|_| ()).map_err(|err| {
			error!(%err, "flush failed");
			IdeaError::Storage(UPDATE_FAILED.to_string())
		})
	}

	/// Read-modify-write one record atomically. `apply` mutates the decoded idea and
	/// returns the value reported to the caller.
	async fn update_record<T, F>(&self, id: &str, mut apply: F) -> Result<T, IdeaError>
	where
		F: FnMut(&mut Idea) -> T,
	{
		let mut corrupt = false;
		let mut outcome: Option<T> = None;
		let updated = self
			.tree
			.update_and_fetch(id.as_bytes(), |old| {
				corrupt = false;
				let old = old?;
				match serde_json::from_slice::<Idea>(old) {
					Ok(mut idea) => {
						let out = apply(&mut idea);
						match serde_json::to_vec(&idea) {
							Ok(bytes) => {
								outcome = Some(out);
								Some(bytes)
							}
							Err(_) => {
								corrupt = true;
								Some(old.to_vec())
							}
						}
					}
					Err(_) => {
						corrupt = true;
						Some(old.to_vec())
					}
				}
			})
			.map_err(|err| {
				error!(%err, id, "update failed");
				IdeaError::Storage(UPDATE_FAILED.to_string())
			})?;
		if updated.is_none() {
			return Err(IdeaError::NotFound(NOT_FOUND.to_string()));
		}
		if corrupt {
			error!(id, "stored idea record could not be decoded");
			return Err(IdeaError::Storage(UPDATE_FAILED.to_string()));
		}
		self.flush().await?;
		outcome.ok_or_else(|| IdeaError::Storage(UPDATE_FAILED.to_string()))
	}

	fn scan<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>, IdeaError> {
		let mut out = Vec::new();
		for kv in self.tree.iter() {
			let (k, v) = kv.map_err(|err| {
				error!(%err, "scan failed");
				IdeaError::Storage(READ_FAILED.to_string())
			})?;
			match serde_json::from_slice::<T>(&v) {
				Ok(rec) => out.push(rec),
				Err(err) => {
					error!(%err, key = %String::from_utf8_lossy(&k), "skipping undecodable idea record");
				}
			}
		}
		Ok(out)
	}
}

#[async_trait]
impl IdeaStore for SledIdeaStore {
	async fn list_all(&self) -> Result<Vec<Idea>, IdeaError> {
		self.scan::<Idea>()
	}

	async fn list_candidates(&self) -> Result<Vec<IdeaRef>, IdeaError> {
		self.scan::<IdeaRef>()
	}

	async fn get(&self, id: &str) -> Result<Option<Idea>, IdeaError> {
		let raw = self.tree.get(id.as_bytes()).map_err(|err| {
			error!(%err, id, "get failed");
			IdeaError::Storage(READ_FAILED.to_string())
		})?;
		match raw {
			Some(v) => serde_json::from_slice(&v).map(Some).map_err(|err| {
				error!(%err, id, "stored idea record could not be decoded");
				IdeaError::Storage(READ_FAILED.to_string())
			}),
			None => Ok(None),
		}
	}

	async fn put(&self, idea: &Idea) -> Result<(), IdeaError> {
		let bytes = serde_json::to_vec(idea).map_err(|err| {
			error!(%err, id = %idea.id, "idea encode failed");
			IdeaError::Storage(SAVE_FAILED.to_string())
		})?;
		let swapped = self
			.tree
			.compare_and_swap(idea.id.as_bytes(), None as Option<&[u8]>, Some(bytes))
			.map_err(|err| {
				error!(%err, id = %idea.id, "put failed");
				IdeaError::Storage(SAVE_FAILED.to_string())
			})?;
		if swapped.is_err() {
			error!(id = %idea.id, "refusing to overwrite existing idea id");
			return Err(IdeaError::Storage(SAVE_FAILED.to_string()));
		}
		self.db.flush_async().await.map_err(|err| {
			error!(%err, id = %idea.id, "flush after put failed");
			IdeaError::Storage(SAVE_FAILED.to_string())
		})?;
		debug!(id = %idea.id, "idea stored");
		Ok(())
	}

	async fn increment_vote(&self, id: &str) -> Result<u64, IdeaError> {
		self.update_record(id, |idea| {
			idea.votes += 1;
			idea.votes
		})
		.await
	}

	async fn append_comment(&self, id: &str, comment: &str) -> Result<usize, IdeaError> {
		self.update_record(id, |idea| {
			idea.comments.push(comment.to_string());
			idea.comments.len()
		})
		.await
	}
}
