//! wiki-chat - terminal chat client for Wikipedia articles
//!
//! Loads an article into a retrieval backend, then answers questions about
//! it through a conversation state machine.

mod config;
mod error;
mod gateway;
mod runtime;
mod state_machine;
mod ui;

use config::ClientConfig;
use gateway::{HttpBackend, LoggingBackend};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env();

    // The terminal belongs to the UI, so logs go to a file
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wiki_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    let http = HttpBackend::new(&config)?;
    tracing::info!(
        api_url = %http.base_url(),
        timeout_secs = ?config.request_timeout.map(|t| t.as_secs()),
        "Starting wiki-chat"
    );
    let backend = LoggingBackend::new(http);

    let (handle, runtime_task) = runtime::spawn(backend);
    ui::run(handle).await?;

    // Dropping the last handle lets the runtime wind down
    if let Err(e) = runtime_task.await {
        tracing::error!(error = %e, "Session runtime panicked");
    }
    tracing::info!("wiki-chat exiting");

    Ok(())
}
