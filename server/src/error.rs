use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use thiserror::Error;

/// Errors surfaced to API callers. Text-generation failures never appear here;
/// the oracle and summarizer absorb them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdeaError {
	#[error("{0}")]
	Validation(String),

	#[error("{0}")]
	NotFound(String),

	#[error("{0}")]
	Storage(String),
}

impl IdeaError {
	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}

	pub fn status(&self) -> StatusCode {
		match self {
			IdeaError::Validation(_) => StatusCode::BAD_REQUEST,
			IdeaError::NotFound(_) => StatusCode::NOT_FOUND,
			IdeaError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for IdeaError {
	fn into_response(self) -> Response {
		let status = self.status();
		(status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
	}
}
