//! Tracker commands (/initialize, /result, !help).
//!
//! Handles command parsing and execution for slash and text commands.

use chrono::{DateTime, Utc};
use serenity::builder::CreateCommand;
use tracing::debug;

use crate::common::error::TrackerError;
use crate::common::types::SubjectId;
use crate::notify::AnnouncementFormatter;
use crate::tracker::SessionManager;

pub const HELP_TEXT: &str = r#"**Available Commands:**
• `/initialize` - Start tracking your gambling session
• `/result` - Stop tracking and show your session result
• `!initialize`, `!result` - Text versions of the above
• `!help` - Show this help message"#;

/// Commands a user can issue to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerCommand {
    /// Begin a session for the invoking user.
    Initialize,
    /// End the invoking user's session and report it.
    Result,
    Help,
}

impl TrackerCommand {
    /// Parse a `!` text command.
    pub fn parse(content: &str) -> Option<Self> {
        let content = content.trim();
        if content.len() > 100 {
            return None;
        }
        let rest = content.strip_prefix('!')?;
        let command = rest.split_whitespace().next()?.to_lowercase();

        debug!("Processing text command: {}", command);

        match command.as_str() {
            "initialize" | "init" | "start" => Some(Self::Initialize),
            "result" | "results" | "stop" => Some(Self::Result),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    /// Map an application command name.
    pub fn from_slash(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "result" => Some(Self::Result),
            _ => None,
        }
    }

    /// Application commands to register with Discord.
    pub fn definitions() -> Vec<CreateCommand> {
        vec![
            CreateCommand::new("initialize").description("Start tracking your OwO gambling session"),
            CreateCommand::new("result").description("Stop tracking and show your session result"),
        ]
    }
}

/// Text to send back to the invoking user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub content: String,
    /// Only shown to the invoker when answering an interaction.
    pub ephemeral: bool,
}

impl CommandReply {
    fn private(content: impl Into<String>) -> Self {
        Self { content: content.into(), ephemeral: true }
    }

    fn public(content: impl Into<String>) -> Self {
        Self { content: content.into(), ephemeral: false }
    }
}

/// Run `command` on behalf of `subject_id`, issued at `at`.
pub fn execute(
    command: TrackerCommand,
    manager: &mut SessionManager,
    formatter: &AnnouncementFormatter,
    subject_id: SubjectId,
    at: DateTime<Utc>,
) -> CommandReply {
    match command {
        TrackerCommand::Initialize => match manager.start_tracking_at(subject_id, at) {
            Ok(_) => CommandReply::private("New session started! Tracking initialized."),
            Err(TrackerError::AlreadyActive { .. }) => CommandReply::private(
                "You already have an active session. Use `/result` to finish it first.",
            ),
            Err(e) => CommandReply::private(e.to_string()),
        },
        TrackerCommand::Result => match manager.end_tracking_at(subject_id, at) {
            Ok(summary) => {
                CommandReply::public(formatter.format_summary(&summary, &mention(subject_id)))
            }
            Err(TrackerError::NoActiveSession { .. }) => CommandReply::private(
                "You don't have an active session. Use `/initialize` to start one.",
            ),
            Err(e) => CommandReply::private(e.to_string()),
        },
        TrackerCommand::Help => CommandReply::private(HELP_TEXT),
    }
}

/// Discord mention markup for a user id.
pub fn mention(subject_id: SubjectId) -> String {
    format!("<@{}>", subject_id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::notify::ChannelNotifier;
    use crate::store::ChannelSessionStore;
    use crate::tracker::EngineSettings;

    fn manager() -> SessionManager {
        let (store, _store_rx) = ChannelSessionStore::new();
        let (notifier, _notify_rx) = ChannelNotifier::new();
        SessionManager::new(EngineSettings::default(), Arc::new(store), Arc::new(notifier))
    }

    #[test]
    fn test_parse_text_commands() {
        assert_eq!(TrackerCommand::parse("!initialize"), Some(TrackerCommand::Initialize));
        assert_eq!(TrackerCommand::parse("  !Result now"), Some(TrackerCommand::Result));
        assert_eq!(TrackerCommand::parse("!help"), Some(TrackerCommand::Help));
        assert_eq!(TrackerCommand::parse("initialize"), None);
        assert_eq!(TrackerCommand::parse("!cf 100"), None);
        assert_eq!(TrackerCommand::parse("!"), None);
    }

    #[test]
    fn test_slash_names() {
        assert_eq!(TrackerCommand::from_slash("initialize"), Some(TrackerCommand::Initialize));
        assert_eq!(TrackerCommand::from_slash("result"), Some(TrackerCommand::Result));
        assert_eq!(TrackerCommand::from_slash("help"), None);
        assert_eq!(TrackerCommand::definitions().len(), 2);
    }

    #[test]
    fn test_lifecycle_replies() {
        let mut manager = manager();
        let formatter = AnnouncementFormatter::default();

        let reply = execute(TrackerCommand::Result, &mut manager, &formatter, 5, Utc::now());
        assert!(reply.ephemeral);
        assert!(reply.content.contains("don't have an active session"));

        let reply = execute(TrackerCommand::Initialize, &mut manager, &formatter, 5, Utc::now());
        assert_eq!(reply, CommandReply::private("New session started! Tracking initialized."));

        let reply = execute(TrackerCommand::Initialize, &mut manager, &formatter, 5, Utc::now());
        assert!(reply.content.contains("already have an active session"));
        assert!(manager.is_tracking(5));

        let reply = execute(TrackerCommand::Result, &mut manager, &formatter, 5, Utc::now());
        assert!(!reply.ephemeral);
        assert_eq!(reply.content, "**Session Result:**\nLost: `0`\nWon: `0`\nNet: `0`");
        assert!(!manager.is_tracking(5));
    }
}
