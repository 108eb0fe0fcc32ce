mod config;
mod errors;
mod llm_client;
mod models;
mod review;
mod routes;
mod sources;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::review::reviewer::{LlmReviewer, Reviewer, UnconfiguredReviewer};
use crate::routes::build_router;
use crate::sources::gdrive::GoogleDriveSource;
use crate::sources::github::GithubSource;
use crate::sources::ContentSources;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Review API v{}", env!("CARGO_PKG_VERSION"));

    let sources = build_sources(&config)?;
    let reviewer = build_reviewer(&config)?;

    info!(
        "Bulk review: concurrency {}, call timeout {:?}",
        config.review_concurrency, config.review_call_timeout
    );

    let state = AppState {
        config: config.clone(),
        sources,
        reviewer,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// One HTTP client shared by both source adapters.
fn build_sources(config: &Config) -> Result<ContentSources> {
    let client = reqwest::Client::builder()
        .timeout(config.source_timeout)
        .build()
        .context("Failed to build source HTTP client")?;

    match &config.gdrive {
        Some(gdrive) => info!("Google Drive source enabled (folder {})", gdrive.folder_id),
        None => warn!("Google Drive source not configured; it will list no CVs"),
    }
    match &config.github {
        Some(github) => info!("GitHub source enabled (repo {})", github.repo),
        None => warn!("GitHub source not configured; it will list no CVs"),
    }

    Ok(ContentSources {
        gdrive: Arc::new(GoogleDriveSource::new(client.clone(), config.gdrive.clone())),
        github: Arc::new(GithubSource::new(client, config.github.clone())),
    })
}

fn build_reviewer(config: &Config) -> Result<Arc<dyn Reviewer>> {
    let Some(api_key) = config.gemini_api_key.clone() else {
        warn!("GEMINI_API_KEY not set; reviews will return a notice instead of feedback");
        return Ok(Arc::new(UnconfiguredReviewer));
    };

    let llm = LlmClient::new(
        api_key,
        config.gemini_model.clone(),
        config.llm_timeout,
        config.llm_max_attempts,
    )
    .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm.model());

    Ok(Arc::new(LlmReviewer::new(llm)))
}
