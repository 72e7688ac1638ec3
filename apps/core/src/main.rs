// Task Router Backend Entry Point
// Classifies requests, extracts file content and dispatches LLM tasks

mod actors;
mod brain;
mod config;
mod cost;
mod error;
mod extract;
mod logging;
mod pipeline;
mod preflight;
mod server;
mod tasks;
mod youtube;

#[cfg(test)]
mod tests;

use actors::llm::LlmActorHandle;
use anyhow::Context;
use config::ServiceConfig;
use extract::Extractors;
use pipeline::RequestProcessor;
use server::AppState;
use std::sync::Arc;
use tracing::{info, warn};
use youtube::TimedTextFetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = ServiceConfig::from_env().context("Failed to load configuration")?;
    logging::init_tracing(config.log_format).context("Failed to initialize logging")?;
    info!(?config, "Configuration loaded");

    let report = preflight::run_preflight_checks(&config);
    let extractors = Extractors::detect();

    let llm = Arc::new(LlmActorHandle::new(config.llm_settings()));
    let transcripts = Arc::new(TimedTextFetcher::new(
        youtube::DEFAULT_BASE_URL,
        config.transcript_language.clone(),
        config.transcript_timestamps,
    ));
    let processor = RequestProcessor::new(llm, extractors, transcripts, config.max_upload_bytes);

    let state = AppState {
        processor,
        preflight: Arc::new(report),
        max_upload_bytes: config.max_upload_bytes,
    };

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    server::serve(listener, state, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
