//! Canonical message types flowing into and out of the tracker.
//!
//! The Discord layer converts gateway payloads into these types so the
//! tracker never sees serenity models directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::types::{MessageId, SubjectId};

/// A raw chat message as delivered by the message source.
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    pub message_id: MessageId,
    /// True when the author is the game bot being observed.
    pub author_is_tracked_bot: bool,
    /// The user this message is about, if one could be determined.
    pub mentioned_subject_id: Option<SubjectId>,
    pub raw_text: String,
    pub embeds: Vec<EmbedPayload>,
    /// When the message was first posted. Edits keep the original time.
    pub created_at: Option<DateTime<Utc>>,
}

/// The parts of an embed the tracker reads.
#[derive(Debug, Clone, Default)]
pub struct EmbedPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub footer: Option<String>,
    pub fields: Vec<EmbedField>,
}

/// A single name/value embed field.
#[derive(Debug, Clone, Default)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Final record of a finished tracking session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub subject_id: SubjectId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_gain: u64,
    pub total_loss: u64,
    pub net_gain: i64,
    pub bets_resolved: u32,
}

/// Human-facing lifecycle announcements.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SessionStarted {
        subject_id: SubjectId,
        started_at: DateTime<Utc>,
    },
    SessionEnded(SessionSummary),
}
