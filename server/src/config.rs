use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_IDEAS_TREE: &str = "ideas";
pub const DEFAULT_LLM_BASE_URL: &str = "http://127.0.0.1:11434/v1";
pub const DEFAULT_LLM_MODEL: &str = "anthropic.claude-v2";

/// Wire format spoken by the text-generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
	/// `{prompt, max_tokens_to_sample, temperature, top_p}` -> `{completion}`
	TextCompletion,
	/// OpenAI-compatible `/chat/completions`
	OpenAiChat,
}

impl FromStr for ApiFormat {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"text-completion" | "text_completion" => Ok(Self::TextCompletion),
			"openai-chat" | "openai_chat" | "openai" => Ok(Self::OpenAiChat),
			other => Err(anyhow!("unknown api format: {}", other)),
		}
	}
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
	pub base_url: String,
	pub api_format: ApiFormat,
	pub model: String,
	pub api_key: Option<String>,
	pub timeout: Duration,
	pub max_retries: u32,
	pub retry_backoff: Duration,
}

pub struct Config {
	pub bind: SocketAddr,
	pub data_dir: String,
	pub ideas_tree: String,
	pub llm: LlmConfig,
}

impl Config {
	pub fn load() -> anyhow::Result<Self> {
		let _ = dotenvy::dotenv();
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Build a config from an arbitrary key lookup (the process environment in `load`).
	pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let port = match lookup("PORT") {
			Some(p) => Some(p.parse::<u16>().with_context(|| format!("invalid PORT: {}", p))?),
			None => None,
		};
		let bind = if let Some(p) = port { format!("127.0.0.1:{}", p) } else { lookup("HTTP_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()) };
		let bind: SocketAddr = bind.parse().with_context(|| format!("invalid HTTP_BIND: {}", bind))?;
		let data_dir = lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
		let ideas_tree = lookup("IDEAS_TREE").unwrap_or_else(|| DEFAULT_IDEAS_TREE.to_string());

		let llm = LlmConfig {
			base_url: lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
			api_format: parse_or(&lookup, "LLM_API_FORMAT", ApiFormat::OpenAiChat)?,
			model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
			api_key: lookup("LLM_API_KEY").filter(|k| !k.is_empty()),
			timeout: Duration::from_millis(parse_or(&lookup, "LLM_TIMEOUT_MS", 15_000u64)?),
			max_retries: parse_or(&lookup, "LLM_MAX_RETRIES", 2u32)?,
			retry_backoff: Duration::from_millis(parse_or(&lookup, "LLM_RETRY_BACKOFF_MS", 250u64)?),
		};
		Ok(Self { bind, data_dir, ideas_tree, llm })
	}
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
	F: Fn(&str) -> Option<String>,
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match lookup(key) {
		Some(raw) => raw.trim().parse::<T>().map_err(|e| anyhow!("invalid {}: {}", key, e)),
		None => Ok(default),
	}
}
