//! Periodic re-scan of recent channel history.
//!
//! Catches bot messages whose gateway events were missed while the
//! connection was down. Results are fed back into the event loop.

use std::sync::Arc;

use futures::future::join_all;
use serenity::builder::GetMessages;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::common::error::{DiscordError, DiscordResult};
use crate::discord::client::DiscordBotEvent;

/// Fetch the last `limit` messages of every channel concurrently.
pub fn spawn_history_fetch(
    http: Arc<Http>,
    channels: Vec<ChannelId>,
    limit: u8,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
) {
    if channels.is_empty() {
        return;
    }

    tokio::spawn(async move {
        let fetches = channels.into_iter().map(|channel_id| {
            let http = http.clone();
            async move { (channel_id, fetch_recent(&http, channel_id, limit).await) }
        });

        for (channel_id, result) in join_all(fetches).await {
            match result {
                Ok(messages) => {
                    debug!("Fetched {} messages from {}", messages.len(), channel_id);
                    let event = DiscordBotEvent::History { channel_id, messages };
                    if let Err(error) = discord_events_tx.send(event) {
                        warn!("Failed to process discord event: {}", error);
                        return;
                    }
                }
                Err(e) => warn!("History fetch for {} failed: {}", channel_id, e),
            }
        }
    });
}

async fn fetch_recent(
    http: &Arc<Http>,
    channel_id: ChannelId,
    limit: u8,
) -> DiscordResult<Vec<serenity::model::channel::Message>> {
    channel_id
        .messages(http, GetMessages::new().limit(limit))
        .await
        .map_err(DiscordError::from)
}
