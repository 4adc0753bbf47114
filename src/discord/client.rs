//! Discord bot client abstraction.
//!
//! Provides a high-level interface for creating and running the Discord bot,
//! hiding serenity implementation details from the rest of the application.

use std::time::Duration;

use serenity::async_trait;
use serenity::http::HttpBuilder;
use serenity::model::application::Interaction;
use serenity::model::channel::Message;
use serenity::model::event::MessageUpdateEvent;
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use serenity::Client;

use backon::BackoffBuilder;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::common::messages::Notification;
use crate::config::types::{Config, RescanConfig};
use crate::discord::handler::TrackerHandler;
use crate::discord::rescan::spawn_history_fetch;
use crate::notify::AnnouncementFormatter;
use crate::tracker::SessionManager;

const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(300);

pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready { context: Context, ready: Ready },
    /// Message received.
    Message { context: Context, message: Message },
    /// Message edited; `new` is only present when it was cached.
    MessageUpdate {
        new: Option<Message>,
        event: MessageUpdateEvent,
    },
    /// Slash command invoked.
    Interaction {
        context: Context,
        interaction: Interaction,
    },
    /// Recent history fetched by the re-scan.
    History {
        channel_id: ChannelId,
        messages: Vec<Message>,
    },
    Disconnected,
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBotEvents {
    fn new(discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> Self {
        Self { discord_events_tx }
    }

    fn forward(&self, event: DiscordBotEvent) {
        if let Err(error) = self.discord_events_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, context: Context, ready: Ready) {
        self.forward(DiscordBotEvent::Ready { context, ready });
    }

    async fn message(&self, context: Context, message: Message) {
        self.forward(DiscordBotEvent::Message { context, message });
    }

    async fn message_update(
        &self,
        _context: Context,
        _old_if_available: Option<Message>,
        new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        self.forward(DiscordBotEvent::MessageUpdate { new, event });
    }

    async fn interaction_create(&self, context: Context, interaction: Interaction) {
        self.forward(DiscordBotEvent::Interaction { context, interaction });
    }
}

/// Channels for Discord bot communication.
pub struct DiscordChannels {
    /// Receiver for session lifecycle notifications from the tracker.
    pub notification_rx: mpsc::UnboundedReceiver<Notification>,
    /// Receiver for shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Builder for creating the Discord bot.
pub struct DiscordBotBuilder {
    config: Config,
    manager: SessionManager,
    channels: DiscordChannels,
}

impl DiscordBotBuilder {
    /// Create a new Discord bot builder.
    pub fn new(config: Config, manager: SessionManager, channels: DiscordChannels) -> Self {
        Self {
            config,
            manager,
            channels,
        }
    }

    /// Build the Discord bot.
    pub async fn build(self) -> anyhow::Result<DiscordBot> {
        let formatter = AnnouncementFormatter::new(
            self.config.messages.session_started.clone(),
            self.config.messages.session_ended.clone(),
        );
        let handler = TrackerHandler::new(self.manager, formatter, &self.config);

        info!(
            "Tracking messages from bot {} (text commands: {})",
            self.config.tracker.bot_id,
            if self.config.discord.enable_text_commands { "on" } else { "off" }
        );

        let (discord_events_tx, discord_events_rx) = mpsc::unbounded_channel::<DiscordBotEvent>();

        let token = self.config.discord.token.clone();
        let client = build_client(&token, discord_events_tx.clone()).await?;

        Ok(DiscordBot {
            client: Some(client),
            token,
            rescan: self.config.rescan,
            handler,
            discord_events_rx,
            discord_events_tx,
            notification_rx: self.channels.notification_rx,
            shutdown_rx: self.channels.shutdown_rx,
        })
    }
}

async fn build_client(token: &str, discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> anyhow::Result<Client> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILDS;

    // Build a custom reqwest client with timeout settings
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let http = HttpBuilder::new(token)
        .client(reqwest_client)
        .build();

    let events = DiscordBotEvents::new(discord_events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

pub struct DiscordBot {
    client: Option<Client>,
    token: String,
    rescan: RescanConfig,
    handler: TrackerHandler,
    discord_events_rx: mpsc::UnboundedReceiver<DiscordBotEvent>,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
    notification_rx: mpsc::UnboundedReceiver<Notification>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBot {
    pub async fn run(mut self) {
        // Extract shard manager before we move client into run_connection
        let shard_manager = self.client.as_ref().map(|c| c.shard_manager.clone());
        let client = &mut self.client;
        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut rescan_interval = self.rescan.enabled.then(|| {
            let mut ticker = interval(Duration::from_secs(self.rescan.interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        let mut processor = EventProcessor {
            discord_events_rx: &mut self.discord_events_rx,
            discord_events_tx: &self.discord_events_tx,
            notification_rx: &mut self.notification_rx,
            handler: &mut self.handler,
            rescan_interval: &mut rescan_interval,
            history_limit: self.rescan.history_limit,
        };

        tokio::select! {
            _ = Self::run_connection(client, &self.token, &self.discord_events_tx) => {},
            _ = processor.process_events(&mut self.shutdown_rx) => {},
            _ = async {
                // Wait for shutdown signal
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                // Gracefully shutdown Discord gateway
                if let Some(ref manager) = shard_manager {
                    info!("Initiating graceful Discord shutdown...");
                    manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                }
            } => {}
        }

        let unfinished = self.handler.active_sessions();
        if unfinished > 0 {
            warn!("{} active sessions were not finished and are discarded", unfinished);
        }
        info!("Discord task ended");
    }

    async fn run_connection(client: &mut Option<Client>, token: &str, discord_events_tx: &mpsc::UnboundedSender<DiscordBotEvent>) {
        /// Create an exponential backoff iterator for Discord reconnection.
        /// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
        fn discord_backoff() -> impl Iterator<Item = Duration> {
            backon::ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(5))
                .with_max_delay(MAX_RECONNECT_DELAY)
                .with_factor(1.1)
                .with_jitter()
                .without_max_times()
                .build()
        }

        let mut backoff = discord_backoff();

        loop {
            info!("Connecting to Discord...");

            let mut client = match client.take() {
                Some(client) => client,
                None => {
                    // serenity mostly handles reconnections itself.
                    match build_client(token, discord_events_tx.clone()).await {
                        Ok(client) => {
                            backoff = discord_backoff();
                            client
                        }
                        Err(e) => {
                            error!("Failed to rebuild Discord client: {}", e);
                            let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
                            warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                            sleep(delay).await;
                            continue;
                        }
                    }
                }
            };

            match client.start().await {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Borrowed state driven by the event loop.
struct EventProcessor<'a> {
    discord_events_rx: &'a mut mpsc::UnboundedReceiver<DiscordBotEvent>,
    discord_events_tx: &'a mpsc::UnboundedSender<DiscordBotEvent>,
    notification_rx: &'a mut mpsc::UnboundedReceiver<Notification>,
    handler: &'a mut TrackerHandler,
    rescan_interval: &'a mut Option<Interval>,
    history_limit: u8,
}

impl EventProcessor<'_> {
    async fn process_events(&mut self, shutdown_rx: &mut watch::Receiver<bool>) {
        let mut connected = false;

        loop {
            tokio::select! {
                // Discord events
                event = self.discord_events_rx.recv() => {
                    match event {
                        Some(event) => {
                            match event {
                                DiscordBotEvent::Ready { context, ready } => {
                                    self.handler.handle_ready(context, ready).await;
                                    connected = true;
                                }
                                DiscordBotEvent::Message { context, message } => {
                                    self.handler.handle_message(context, message).await;
                                }
                                DiscordBotEvent::MessageUpdate { new, event } => {
                                    self.handler.handle_message_update(new, event);
                                }
                                DiscordBotEvent::Interaction { context, interaction } => {
                                    self.handler.handle_interaction(context, interaction).await;
                                }
                                DiscordBotEvent::History { channel_id, messages } => {
                                    self.handler.handle_history(channel_id, messages);
                                }
                                DiscordBotEvent::Disconnected => {
                                    connected = false;
                                }
                            }
                        }
                        None => {
                            debug!("Discord events channel closed.");
                            break;
                        }
                    }
                }

                // Session notifications
                notification = self.notification_rx.recv() => {
                    match notification {
                        Some(notification) => {
                            self.handler.handle_notification(notification).await;
                        }
                        None => {
                            warn!("Notification channel closed");
                            break;
                        }
                    }
                }

                // History re-scan (skipped while not connected)
                _ = next_tick(self.rescan_interval) => {
                    match self.handler.http() {
                        Some(http) if connected => {
                            let channels = self.handler.rescan_targets();
                            spawn_history_fetch(http, channels, self.history_limit, self.discord_events_tx.clone());
                        }
                        _ => debug!("Skipping history re-scan - Discord not connected"),
                    }
                }

                // Shutdown signal
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping event processing");
                        break;
                    }
                }
            }
        }
    }
}

/// Waits for the next tick, or forever when re-scanning is disabled.
async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
