mod ingest;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relaypack_core::{
    load_config, metrics::register_metrics, validate_config, FfmpegTranscoder, IngressHub,
    Publisher, Sequencer, TelegramGateway, Transcoder,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wait after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting relaypack v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("RELAYPACK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        config = %serde_json::to_string(&config.sanitized()).unwrap_or_default(),
        "Configuration loaded"
    );

    if let Err(e) = register_metrics(prometheus::default_registry()) {
        warn!("Failed to register metrics: {}", e);
    }

    // Gateway and transcoder
    let gateway = Arc::new(TelegramGateway::new(config.telegram.clone()));
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    if let Err(e) = transcoder.validate().await {
        // Photos and non-video documents still work without an encoder.
        warn!("Transcoder validation failed, video shrinking degraded: {}", e);
    }

    // Pipeline wiring
    let hub = Arc::new(IngressHub::new());
    let (queue_tx, queue_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, _) = broadcast::channel(1);

    let sequencer = Sequencer::new(config.sequencer.clone(), hub.clone(), queue_tx);
    let sequencer_handle = {
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { sequencer.run(shutdown).await })
    };

    let publisher = Publisher::new(
        gateway.clone(),
        transcoder,
        config.publisher.clone(),
        config.transcoder.target_size_bytes,
        config.telegram.target_chat_id,
    );
    let publisher_handle = {
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { publisher.run(queue_rx, shutdown).await })
    };

    let poll_handle = {
        let gateway = gateway.clone();
        let hub = hub.clone();
        let telegram_config = config.telegram.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { poll_loop(gateway, hub, telegram_config, shutdown).await })
    };

    info!("Pipeline started, waiting for updates");
    shutdown_signal().await;
    info!("Shutting down");

    let _ = shutdown_tx.send(());
    let _ = poll_handle.await;
    let _ = sequencer_handle.await;
    let _ = publisher_handle.await;

    info!("Shutdown complete");
    Ok(())
}

/// Long-polls the platform and feeds accepted messages into the hub.
async fn poll_loop(
    gateway: Arc<TelegramGateway>,
    hub: Arc<IngressHub>,
    config: relaypack_core::TelegramConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut offset: i64 = 0;
    loop {
        let updates = tokio::select! {
            result = gateway.get_updates(offset) => result,
            _ = shutdown.recv() => {
                info!("Shutdown signal received, poller stopping");
                return;
            }
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                let delay = e.retry_after().unwrap_or(POLL_RETRY_DELAY);
                warn!(delay = ?delay, "Poll failed: {}", e);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => continue,
                    _ = shutdown.recv() => return,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            if !ingest::is_allowed(&config, &message) {
                warn!(chat = message.chat.id, "Ignoring message from unauthorized user");
                continue;
            }
            if let Some(event) = ingest::to_event(message) {
                hub.add(event).await;
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
