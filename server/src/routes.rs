use std::sync::Arc;

use axum::{
	body::Bytes,
	extract::{Path, Request, State},
	http::{header, HeaderValue, Method, StatusCode},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use serde::Serialize;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::error::IdeaError;
use crate::handlers;
use crate::models::{CommentResponse, Idea, SubmitResponse, VoteResponse};
use crate::pipeline::SubmissionPipeline;
use crate::store::IdeaStore;

pub const ALLOW_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
pub const ALLOW_METHODS: &str = "GET,POST,OPTIONS";

pub struct AppState {
	pub store: Arc<dyn IdeaStore>,
	pub pipeline: SubmissionPipeline,
}

#[derive(Serialize)]
struct Health { status: &'static str }

pub fn build_router(state: Arc<AppState>) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/ideas", get(list_ideas).post(submit_idea))
		.route("/ideas/:id/vote", post(vote_idea))
		.route("/ideas/:id/comments", post(comment_idea))
		.fallback(not_found)
		.layer(middleware::from_fn(answer_preflight))
		.layer(SetResponseHeaderLayer::overriding(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")))
		.layer(SetResponseHeaderLayer::overriding(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)))
		.layer(SetResponseHeaderLayer::overriding(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)))
		.layer(SetResponseHeaderLayer::overriding(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true")))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// OPTIONS on any path is answered here, before routing can turn it into a 405.
async fn answer_preflight(req: Request, next: Next) -> Response {
	if req.method() == Method::OPTIONS {
		return (StatusCode::OK, Json("OK")).into_response();
	}
	next.run(req).await
}

async fn health() -> Json<Health> { Json(Health { status: "ok" }) }

async fn not_found() -> IdeaError {
	IdeaError::NotFound("Not found".to_string())
}

async fn list_ideas(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Idea>>, IdeaError> {
	Ok(Json(handlers::list_ideas(state.store.as_ref()).await?))
}

async fn submit_idea(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<SubmitResponse>, IdeaError> {
	let result = state.pipeline.submit(&body).await?;
	Ok(Json(result.into()))
}

async fn vote_idea(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<VoteResponse>, IdeaError> {
	let votes = handlers::vote(state.store.as_ref(), &id).await?;
	Ok(Json(VoteResponse { message: "Vote recorded", id, votes }))
}

async fn comment_idea(State(state): State<Arc<AppState>>, Path(id): Path<String>, body: Bytes) -> Result<Json<CommentResponse>, IdeaError> {
	let comments = handlers::add_comment(state.store.as_ref(), &id, &body).await?;
	Ok(Json(CommentResponse { message: "Comment added", id, comments }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::llm::MockBackend;
	use crate::oracle::LlmSimilarityOracle;
	use crate::pipeline::tests::FlakyStore;
	use crate::summarizer::Summarizer;
	use axum::body::Body;
	use std::sync::atomic::Ordering;
	use tower::ServiceExt;

	fn app_with(store: Arc<FlakyStore>, oracle_reply: &str) -> Router {
		let oracle = Arc::new(LlmSimilarityOracle::new(Arc::new(MockBackend::new().with_response(oracle_reply))));
		let summarizer = Arc::new(Summarizer::new(Arc::new(MockBackend::new().with_response("A short summary."))));
		let pipeline = SubmissionPipeline::new(store.clone(), oracle, summarizer);
		build_router(Arc::new(AppState { store, pipeline }))
	}

	async fn call(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
		let req = axum::http::Request::builder().method(method).uri(uri).header("content-type", "application/json").body(Body::from(body.to_string())).unwrap();
		let resp = app.clone().oneshot(req).await.unwrap();
		let status = resp.status();
		let headers = resp.headers().clone();
		let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
		let json = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null) };
		(status, headers, json)
	}

	fn assert_cors(headers: &axum::http::HeaderMap) {
		assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
		assert_eq!(headers.get("access-control-allow-headers").unwrap(), ALLOW_HEADERS);
		assert_eq!(headers.get("access-control-allow-methods").unwrap(), ALLOW_METHODS);
		assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
	}

	#[tokio::test]
	async fn test_options_anywhere() {
		let app = app_with(Arc::new(FlakyStore::new()), "UNIQUE");
		for uri in ["/ideas", "/ideas/x/vote", "/does/not/exist"] {
			let (status, headers, body) = call(&app, "OPTIONS", uri, "").await;
			assert_eq!(status, StatusCode::OK);
			assert_eq!(body, serde_json::json!("OK"));
			assert_cors(&headers);
		}
	}

	#[tokio::test]
	async fn test_submit_list_vote_comment() {
		let store = Arc::new(FlakyStore::new());
		let app = app_with(store.clone(), "UNIQUE");

		let (status, headers, body) = call(&app, "POST", "/ideas", r#"{"idea":"build a recycling app"}"#).await;
		assert_eq!(status, StatusCode::OK);
		assert_cors(&headers);
		assert_eq!(body["message"], "Idea submitted successfully");
		assert_eq!(body["duplicate"], false);
		assert!(body["duplicate_of"].is_null());
		let id = body["id"].as_str().unwrap().to_string();

		let (status, _, body) = call(&app, "POST", &format!("/ideas/{}/vote", id), "").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["votes"], 1);

		let (status, _, body) = call(&app, "POST", &format!("/ideas/{}/comments", id), r#"{"comment":"love it"}"#).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["comments"], 1);

		let (status, headers, body) = call(&app, "GET", "/ideas", "").await;
		assert_eq!(status, StatusCode::OK);
		assert_cors(&headers);
		assert_eq!(body, serde_json::json!([{
			"id": id,
			"idea": "build a recycling app",
			"votes": 1,
			"summary": "A short summary.",
			"comments": ["love it"]
		}]));
	}

	#[tokio::test]
	async fn test_duplicate_submission_names_first_idea() {
		let store = Arc::new(FlakyStore::new());
		store.put(&Idea::new("first-id".into(), "build a recycling app".into(), "s".into(), None)).await.unwrap();
		let app = app_with(store, "DUPLICATE: first-id");
		let (status, _, body) = call(&app, "POST", "/ideas", r#"{"idea":"build a recycling app"}"#).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["duplicate"], true);
		assert_eq!(body["duplicate_of"], "first-id");
	}

	#[tokio::test]
	async fn test_error_statuses() {
		let store = Arc::new(FlakyStore::new());
		let app = app_with(store.clone(), "UNIQUE");

		let (status, headers, body) = call(&app, "POST", "/ideas", "not json").await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_cors(&headers);
		assert_eq!(body, serde_json::json!({ "error": "malformed body" }));

		let (status, _, body) = call(&app, "POST", "/ideas", r#"{"title":"x"}"#).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "missing field: idea");

		let (status, headers, _) = call(&app, "POST", "/ideas/nope/vote", "").await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_cors(&headers);

		let (status, _, _) = call(&app, "POST", "/ideas/nope/comments", r#"{"comment":"hi"}"#).await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, headers, _) = call(&app, "DELETE", "/ideas", "").await;
		assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
		assert_cors(&headers);

		store.fail_writes.store(true, Ordering::SeqCst);
		let (status, _, body) = call(&app, "POST", "/ideas", r#"{"idea":"x"}"#).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body, serde_json::json!({ "error": "Failed to save idea" }));
	}

	#[tokio::test]
	async fn test_health() {
		let app = app_with(Arc::new(FlakyStore::new()), "UNIQUE");
		let (status, _, body) = call(&app, "GET", "/health", "").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
	}
}
