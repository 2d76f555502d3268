use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use idea_board_server::config::{self, Config};
use idea_board_server::llm::{HttpBackend, LlmBackend, RetryingBackend};
use idea_board_server::oracle::LlmSimilarityOracle;
use idea_board_server::pipeline::SubmissionPipeline;
use idea_board_server::routes::{build_router, AppState};
use idea_board_server::store::SledIdeaStore;
use idea_board_server::summarizer::Summarizer;

#[derive(Parser, Debug)]
#[command(name = "idea-board-server", version, about = "Idea board with AI-assisted duplicate detection")]
struct Cli {
	/// Bind address for the HTTP server
	#[arg(long, env = "HTTP_BIND", default_value = config::DEFAULT_BIND)]
	bind: String,

	/// Data directory root
	#[arg(long, env = "DATA_DIR", default_value = config::DEFAULT_DATA_DIR)]
	data_dir: String,

	/// Text-generation endpoint base URL
	#[arg(long, env = "LLM_BASE_URL", default_value = config::DEFAULT_LLM_BASE_URL)]
	llm_base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	init_tracing();
	let mut cfg = Config::load()?;
	let cli = Cli::parse();

	if cli.bind != config::DEFAULT_BIND { cfg.bind = cli.bind.parse().with_context(|| format!("invalid --bind: {}", cli.bind))?; }
	if cli.data_dir != config::DEFAULT_DATA_DIR { cfg.data_dir = cli.data_dir.clone(); }
	if cli.llm_base_url != config::DEFAULT_LLM_BASE_URL { cfg.llm.base_url = cli.llm_base_url.clone(); }

	let store = Arc::new(SledIdeaStore::open(&cfg.data_dir, &cfg.ideas_tree)?);

	let http = HttpBackend::from_config(&cfg.llm)?;
	let backend: Arc<dyn LlmBackend> = Arc::new(RetryingBackend::new(Arc::new(http), cfg.llm.max_retries, cfg.llm.retry_backoff));
	let oracle = Arc::new(LlmSimilarityOracle::new(backend.clone()));
	let summarizer = Arc::new(Summarizer::new(backend.clone()));

	let state = Arc::new(AppState {
		store: store.clone(),
		pipeline: SubmissionPipeline::new(store.clone(), oracle, summarizer),
	});

	let app = build_router(state);
	let listener = tokio::net::TcpListener::bind(cfg.bind).await.with_context(|| format!("bind {}", cfg.bind))?;
	info!(bind = %cfg.bind, data_dir = %cfg.data_dir, model = backend.id(), "Starting HTTP server");
	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

	info!("Shutdown signal received");
	store.flush().await?;
	Ok(())
}

fn init_tracing() {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let fmt_layer = fmt::layer().with_target(false).with_ansi(false).with_writer(std::io::stderr);
	tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

async fn shutdown_signal() {
	let _ = signal::ctrl_c().await;
}
