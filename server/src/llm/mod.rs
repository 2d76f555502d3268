//! Text-generation backends.
//!
//! The oracle and summarizer only see [`LlmBackend`]; which HTTP wire format is
//! spoken, and whether calls are retried, is decided at startup.

pub mod http;
pub mod mock;
pub mod retry;
pub mod traits;

pub use http::HttpBackend;
pub use mock::MockBackend;
pub use retry::RetryingBackend;
pub use traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError};
