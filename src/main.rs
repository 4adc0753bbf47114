//! Winningtrack - OwO gambling session tracker for Discord
//!
//! Watches the OwO bot's coin-flip, slots and blackjack messages and keeps
//! per-user gain/loss totals between `/initialize` and `/result`.

mod common;
mod config;
mod discord;
mod notify;
mod store;
mod tracker;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use config::{env::get_config_path, load_and_validate};
use discord::{DiscordBotBuilder, DiscordChannels};
use notify::ChannelNotifier;
use store::{run_store_writer, ChannelSessionStore, JsonlWriter};
use tracker::{EngineSettings, SessionManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Winningtrack v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        error!("See winningtrack.conf.example for reference.");
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Tracked bot: {}", config.tracker.bot_id);
    info!("  Session store: {}", config.store.path);
    match config.tracker.stale_bet_secs {
        Some(secs) => info!("  Pending bets expire after {}s", secs),
        None => info!("  Pending bets never expire"),
    }
    if config.rescan.enabled {
        info!(
            "  History re-scan every {}s ({} messages)",
            config.rescan.interval_secs, config.rescan.history_limit
        );
    }

    // ============================================================
    // Create channels for communication
    // ============================================================

    let (store, store_rx) = ChannelSessionStore::new();
    let (notifier, notification_rx) = ChannelNotifier::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let store_task = tokio::spawn(run_store_writer(store_rx, JsonlWriter::new(&config.store.path)));

    let settings = EngineSettings {
        processed_capacity: config.tracker.processed_capacity,
        stale_after: config
            .tracker
            .stale_bet_secs
            .and_then(|secs| chrono::Duration::try_seconds(secs as i64)),
    };
    let manager = SessionManager::new(settings, Arc::new(store), Arc::new(notifier));

    // ============================================================
    // Start Discord bot
    // ============================================================
    let discord_channels = DiscordChannels {
        notification_rx,
        shutdown_rx,
    };

    let discord_bot = DiscordBotBuilder::new(config, manager, discord_channels)
        .build()
        .await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(async move {
        discord_bot.run().await;
    });

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping...");
            true
        }
        _ = &mut discord_task => false,
    };

    // Handle graceful shutdown
    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (Discord task already exited): {}", e);
        }
        let timeout = Duration::from_secs(5);
        match tokio::time::timeout(timeout, discord_task).await {
            Ok(Ok(())) => info!("Discord bot stopped gracefully"),
            Ok(Err(e)) => warn!("Discord task panicked: {}", e),
            Err(_) => warn!("Discord shutdown timed out"),
        }
    }

    // The tracker, and with it the last store sender, is gone once the
    // Discord task has finished.
    match tokio::time::timeout(Duration::from_secs(5), store_task).await {
        Ok(Ok(())) => debug!("Session store flushed"),
        Ok(Err(e)) => warn!("Session store task panicked: {}", e),
        Err(_) => warn!("Session store flush timed out"),
    }

    info!("Exiting...");
    Ok(())
}

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
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
