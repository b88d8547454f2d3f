//! Legal document simplifier server
//!
//! Accepts PDF and DOCX uploads and returns an analysis report with a
//! plain-language rewrite, detected clauses, deadlines and insights.
//!
//! - `GET /` service description
//! - `GET /health` liveness check
//! - `POST /api/upload` multipart upload (field `file`)
//!
//! Simplification goes through the Gemini API. The key is read from
//! `GEMINI_API_KEY`; other settings come from an optional TOML file and
//! environment overrides.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use simplify_core::{GeminiClient, Pipeline, PipelineConfig};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_health, handle_index, handle_upload};

/// Room for multipart framing on top of the document itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Command-line arguments for the simplify server
#[derive(Parser, Debug)]
#[command(name = "simplify-server")]
#[command(about = "Plain-language simplification and clause analysis for legal documents")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "2")]
    rate_limit: u32,

    /// Seconds to spend simplifying before returning a partial report
    #[arg(long, default_value = "300")]
    analysis_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Budget for the simplification stage of one upload
    pub analysis_timeout: Duration,
}

/// Routes without the per-IP governor, which needs connection info
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.pipeline.config().limits.max_document_bytes + MULTIPART_OVERHEAD;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/upload", post(handle_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PipelineConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    let client = GeminiClient::new(config.llm.clone())
        .context("GEMINI_API_KEY must be set to start the server")?;

    info!(
        model = %config.llm.model,
        max_chunk_len = config.chunking.max_chunk_len,
        concurrency = config.simplifier.concurrency,
        "Loaded pipeline configuration"
    );

    let pipeline = Pipeline::with_service(config, Arc::new(client))
        .context("Failed to build pipeline")?;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        analysis_timeout: Duration::from_secs(args.analysis_timeout_secs),
    };

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .context("Failed to create rate limiter config")?,
    );

    let app = build_router(state).layer(GovernorLayer {
        config: governor_conf,
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Analysis timeout: {}s", args.analysis_timeout_secs);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
