use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use word_image_gen::{
    app_state::AppState, config::AppConfig, protocol::McpServer, services::reaper,
};

#[tokio::main]
async fn main() {
    // Structured logging on stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing word-image-gen server");

    if let Some(addr) = &config.metrics_bind_addr {
        let addr: SocketAddr = addr.parse().expect("METRICS_BIND_ADDR is not a socket address");
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .expect("Failed to install Prometheus metrics exporter");
        tracing::info!(%addr, "Prometheus metrics listener started");
    }

    metrics::describe_counter!("image_jobs_total", "Generation batches submitted");
    metrics::describe_counter!(
        "image_items_succeeded_total",
        "Words for which an image was generated and saved"
    );
    metrics::describe_counter!("image_items_failed_total", "Words whose generation failed");
    metrics::describe_histogram!("image_item_seconds", "Time spent on a single word");
    metrics::describe_gauge!("image_jobs_active", "Batches currently running");
    metrics::describe_gauge!("image_jobs_tracked", "Jobs held in the in-memory registry");

    if !AppConfig::has_credential(&config.openai_api_key) {
        tracing::warn!("OPENAI_API_KEY not set; dalle generations will fail");
    }
    if !AppConfig::has_credential(&config.stability_api_key) {
        tracing::warn!("STABILITY_API_KEY not set; stability generations will fail");
    }

    let shutdown = CancellationToken::new();

    tracing::info!(output_dir = %config.output_dir.display(), "Preparing output directory");
    let state = AppState::from_config(&config, shutdown.clone())
        .await
        .expect("Failed to prepare output directory");

    tokio::spawn(reaper::run(
        state.jobs.clone(),
        config.reap_interval(),
        shutdown.clone(),
    ));

    let server = Arc::new(McpServer::new(state));

    tracing::info!("Serving MCP over stdio");

    tokio::select! {
        result = server.serve(tokio::io::stdin(), tokio::io::stdout()) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Transport error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    shutdown.cancel();
    tracing::info!("Server stopped");
}
