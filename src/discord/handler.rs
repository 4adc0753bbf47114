//! Discord event handling for the tracker.
//!
//! Owns the `SessionManager`; every gateway event, history batch and
//! notification is applied here from the single event loop.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::builder::{CreateInteractionResponse, CreateInteractionResponseMessage};
use serenity::http::Http;
use serenity::model::application::{Command, Interaction};
use serenity::model::channel::Message;
use serenity::model::event::MessageUpdateEvent;
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::*;
use tracing::{debug, error, info, warn};

use crate::common::error::{DiscordError, DiscordResult};
use crate::common::messages::{IncomingMessage, Notification};
use crate::common::types::SubjectId;
use crate::config::Config;
use crate::discord::commands::{self, mention, CommandReply, TrackerCommand};
use crate::discord::payload::{
    incoming_from_message, incoming_from_update, snowflake_time, RecentSubjects,
};
use crate::notify::AnnouncementFormatter;
use crate::tracker::{ProcessOutcome, SessionManager};

const RECENT_SUBJECTS_CAPACITY: usize = 512;

pub struct TrackerHandler {
    manager: SessionManager,
    formatter: AnnouncementFormatter,
    /// The game bot whose messages are tracked.
    bot_id: UserId,
    guild_id: Option<GuildId>,
    announce_channel: Option<ChannelId>,
    enable_text_commands: bool,
    recent_subjects: RecentSubjects,
    /// Where each tracked subject was last seen playing.
    session_channels: HashMap<SubjectId, ChannelId>,
    http: Option<Arc<Http>>,
    own_id: Option<UserId>,
}

impl TrackerHandler {
    pub fn new(manager: SessionManager, formatter: AnnouncementFormatter, config: &Config) -> Self {
        Self {
            manager,
            formatter,
            bot_id: UserId::new(config.tracker.bot_id),
            guild_id: config.discord.guild_id.map(GuildId::new),
            announce_channel: config.discord.announce_channel.map(ChannelId::new),
            enable_text_commands: config.discord.enable_text_commands,
            recent_subjects: RecentSubjects::new(RECENT_SUBJECTS_CAPACITY),
            session_channels: HashMap::new(),
            http: None,
            own_id: None,
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.manager.active_sessions()
    }

    pub fn http(&self) -> Option<Arc<Http>> {
        self.http.clone()
    }

    pub async fn handle_ready(&mut self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);
        self.own_id = Some(ready.user.id);
        self.http = Some(ctx.http.clone());

        if let Err(e) = self.register_commands(&ctx.http).await {
            error!("{}", e);
        }
    }

    async fn register_commands(&self, http: &Arc<Http>) -> DiscordResult<()> {
        let definitions = TrackerCommand::definitions();
        let registered = match self.guild_id {
            Some(guild_id) => guild_id.set_commands(http, definitions).await,
            None => Command::set_global_commands(http, definitions).await,
        }
        .map_err(DiscordError::CommandRegistration)?;

        info!(
            "Registered {} application commands ({})",
            registered.len(),
            if self.guild_id.is_some() { "guild" } else { "global" }
        );
        Ok(())
    }

    pub async fn handle_message(&mut self, ctx: Context, message: Message) {
        // Ignore our own messages
        if Some(message.author.id) == self.own_id {
            return;
        }

        if message.author.id == self.bot_id {
            let incoming = incoming_from_message(&message, self.bot_id);
            self.track(incoming, message.channel_id);
            return;
        }

        if message.author.bot || !self.enable_text_commands {
            return;
        }

        if let Some(command) = TrackerCommand::parse(&message.content) {
            info!("!{:?} command from {}", command, message.author.name);
            let at = snowflake_time(message.id.get()).unwrap_or_else(Utc::now);
            let reply = self.run_command(command, message.author.id.get(), message.channel_id, at);
            if let Err(e) = message.channel_id.say(&ctx.http, &reply.content).await {
                error!("{}", DiscordError::SendFailed(e));
            }
        }
    }

    /// The game bot edits placements into their results.
    pub fn handle_message_update(&mut self, new: Option<Message>, event: MessageUpdateEvent) {
        let incoming = match new.as_ref() {
            Some(message) => incoming_from_message(message, self.bot_id),
            None => match incoming_from_update(&event, self.bot_id) {
                Some(incoming) => incoming,
                None => {
                    debug!("Ignoring update {} without author", event.id);
                    return;
                }
            },
        };

        if incoming.author_is_tracked_bot {
            self.track(incoming, event.channel_id);
        }
    }

    pub async fn handle_interaction(&mut self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let Some(tracker_command) = TrackerCommand::from_slash(&command.data.name) else {
            warn!("Unknown application command: {}", command.data.name);
            return;
        };

        info!("/{} command from {}", command.data.name, command.user.name);
        let at = snowflake_time(command.id.get()).unwrap_or_else(Utc::now);
        let reply = self.run_command(tracker_command, command.user.id.get(), command.channel_id, at);

        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(reply.content)
                .ephemeral(reply.ephemeral),
        );
        if let Err(e) = command.create_response(&ctx.http, response).await {
            error!("{}", DiscordError::SendFailed(e));
        }
    }

    /// Replay fetched history, oldest first. Already counted messages are
    /// skipped by the engine.
    pub fn handle_history(&mut self, channel_id: ChannelId, messages: Vec<Message>) {
        debug!("Re-scanning {} messages in {}", messages.len(), channel_id);
        for message in messages.iter().rev() {
            if message.author.id == self.bot_id {
                let incoming = incoming_from_message(message, self.bot_id);
                self.track(incoming, channel_id);
            }
        }
    }

    pub async fn handle_notification(&mut self, notification: Notification) {
        let subject_id = match &notification {
            Notification::SessionStarted { subject_id, .. } => *subject_id,
            Notification::SessionEnded(summary) => {
                self.session_channels.remove(&summary.subject_id);
                summary.subject_id
            }
        };

        let text = self.formatter.format(&notification, &mention(subject_id));
        info!("Announcement for {}: {}", subject_id, text.replace('\n', " "));

        let (Some(channel_id), Some(http)) = (self.announce_channel, self.http.as_ref()) else {
            return;
        };
        if let Err(e) = channel_id.say(http, &text).await {
            error!("{}", DiscordError::SendFailed(e));
        }
    }

    /// Channels with active sessions worth re-scanning.
    pub fn rescan_targets(&self) -> Vec<ChannelId> {
        let mut channels: Vec<ChannelId> = self
            .session_channels
            .iter()
            .filter(|(subject_id, _)| self.manager.is_tracking(**subject_id))
            .map(|(_, channel_id)| *channel_id)
            .collect();
        channels.sort();
        channels.dedup();
        channels
    }

    /// `at` is the command's Discord timestamp, so session bounds compare
    /// against message times on the same clock.
    fn run_command(
        &mut self,
        command: TrackerCommand,
        subject_id: SubjectId,
        channel_id: ChannelId,
        at: DateTime<Utc>,
    ) -> CommandReply {
        let reply = commands::execute(command, &mut self.manager, &self.formatter, subject_id, at);
        if self.manager.is_tracking(subject_id) {
            self.session_channels.entry(subject_id).or_insert(channel_id);
        } else {
            self.session_channels.remove(&subject_id);
        }
        reply
    }

    fn track(&mut self, mut incoming: IncomingMessage, channel_id: ChannelId) {
        self.recent_subjects.resolve(&mut incoming);

        if let ProcessOutcome::Ignored(reason) = self.manager.process(&incoming) {
            debug!(message_id = incoming.message_id, ?reason, "Message ignored");
            return;
        }

        if let Some(subject_id) = incoming.mentioned_subject_id {
            if self.manager.is_tracking(subject_id) {
                self.session_channels.insert(subject_id, channel_id);
            }
        }
    }
}
