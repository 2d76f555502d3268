use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::IdeaError;

/// A stored idea. `text` travels as `idea` on the wire and in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
	pub id: String,
	#[serde(rename = "idea")]
	pub text: String,
	#[serde(default)]
	pub votes: u64,
	#[serde(default)]
	pub summary: String,
	#[serde(default)]
	pub comments: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub duplicate_of: Option<String>,
}

impl Idea {
	pub fn new(id: String, text: String, summary: String, duplicate_of: Option<String>) -> Self {
		Self { id, text, votes: 0, summary, comments: Vec::new(), duplicate_of }
	}
}

/// `{id, idea}` projection used when comparing a new idea against stored ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaRef {
	pub id: String,
	#[serde(rename = "idea")]
	pub text: String,
}

impl From<&Idea> for IdeaRef {
	fn from(idea: &Idea) -> Self {
		Self { id: idea.id.clone(), text: idea.text.clone() }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
	pub id: String,
	pub duplicate: bool,
	pub duplicate_of: Option<String>,
}

#[derive(Serialize)]
pub struct SubmitResponse {
	pub message: &'static str,
	pub id: String,
	pub duplicate: bool,
	pub duplicate_of: Option<String>,
}

impl From<SubmissionResult> for SubmitResponse {
	fn from(r: SubmissionResult) -> Self {
		Self { message: "Idea submitted successfully", id: r.id, duplicate: r.duplicate, duplicate_of: r.duplicate_of }
	}
}

#[derive(Serialize)]
pub struct VoteResponse {
	pub message: &'static str,
	pub id: String,
	pub votes: u64,
}

#[derive(Serialize)]
pub struct CommentResponse {
	pub message: &'static str,
	pub id: String,
	pub comments: usize,
}

/// Pull a required, non-blank string field out of a raw JSON object body.
pub fn required_text_field(raw: &[u8], field: &str) -> Result<String, IdeaError> {
	if raw.iter().all(|b| b.is_ascii_whitespace()) {
		return Err(IdeaError::validation("missing body"));
	}
	let body: JsonValue = serde_json::from_slice(raw).map_err(|_| IdeaError::validation("malformed body"))?;
	let obj = body.as_object().ok_or_else(|| IdeaError::validation("malformed body"))?;
	match obj.get(field) {
		None | Some(JsonValue::Null) => Err(IdeaError::validation(format!("missing field: {}", field))),
		Some(JsonValue::String(s)) if s.trim().is_empty() => Err(IdeaError::validation(format!("{} must not be empty", field))),
		Some(JsonValue::String(s)) => Ok(s.clone()),
		Some(_) => Err(IdeaError::validation(format!("field {} must be a string", field))),
	}
}
