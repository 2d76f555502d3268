pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod oracle;
pub mod pipeline;
pub mod routes;
pub mod store;
pub mod summarizer;
