//! Conversion of serenity messages into tracker input.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serenity::model::channel::{Embed, Message};
use serenity::model::event::MessageUpdateEvent;
use serenity::model::id::UserId;
use serenity::model::user::User;

use crate::common::messages::{EmbedField, EmbedPayload, IncomingMessage};
use crate::common::types::{MessageId, SubjectId};

/// 2015-01-01T00:00:00Z in Unix milliseconds.
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Creation time encoded in a Discord snowflake id.
pub fn snowflake_time(id: u64) -> Option<DateTime<Utc>> {
    let millis = (id >> 22).checked_add(DISCORD_EPOCH_MS)?;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

/// Build tracker input from a full message.
///
/// The subject is the first mentioned user who is not the game bot, or
/// else the author of the message the bot replied to.
pub fn incoming_from_message(message: &Message, bot_id: UserId) -> IncomingMessage {
    let replied_to = message
        .referenced_message
        .as_deref()
        .map(|m| &m.author)
        .filter(|author| author.id != bot_id && !author.bot);

    IncomingMessage {
        message_id: message.id.get(),
        author_is_tracked_bot: message.author.id == bot_id,
        mentioned_subject_id: first_subject(&message.mentions, bot_id)
            .or_else(|| replied_to.map(|u| u.id.get())),
        raw_text: message.content.clone(),
        embeds: message.embeds.iter().map(embed_payload).collect(),
        created_at: snowflake_time(message.id.get()),
    }
}

/// Build tracker input from a partial update event.
///
/// Returns `None` when the event does not say who authored the message.
pub fn incoming_from_update(event: &MessageUpdateEvent, bot_id: UserId) -> Option<IncomingMessage> {
    let author = event.author.as_ref()?;

    Some(IncomingMessage {
        message_id: event.id.get(),
        author_is_tracked_bot: author.id == bot_id,
        mentioned_subject_id: event
            .mentions
            .as_deref()
            .and_then(|mentions| first_subject(mentions, bot_id)),
        raw_text: event.content.clone().unwrap_or_default(),
        embeds: event
            .embeds
            .as_deref()
            .map(|embeds| embeds.iter().map(embed_payload).collect())
            .unwrap_or_default(),
        created_at: snowflake_time(event.id.get()),
    })
}

fn first_subject(mentions: &[User], bot_id: UserId) -> Option<SubjectId> {
    mentions
        .iter()
        .find(|user| user.id != bot_id && !user.bot)
        .map(|user| user.id.get())
}

fn embed_payload(embed: &Embed) -> EmbedPayload {
    EmbedPayload {
        title: embed.title.clone(),
        description: embed.description.clone(),
        footer: embed.footer.as_ref().map(|f| f.text.clone()),
        fields: embed
            .fields
            .iter()
            .map(|f| EmbedField {
                name: f.name.clone(),
                value: f.value.clone(),
            })
            .collect(),
    }
}

/// Remembers which subject a bot message belongs to.
///
/// The game bot edits its messages into their final state, and edit events
/// usually omit the reply reference that identified the subject.
#[derive(Debug)]
pub struct RecentSubjects {
    capacity: usize,
    order: VecDeque<MessageId>,
    subjects: HashMap<MessageId, SubjectId>,
}

impl RecentSubjects {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            subjects: HashMap::new(),
        }
    }

    pub fn remember(&mut self, message_id: MessageId, subject_id: SubjectId) {
        if self.subjects.insert(message_id, subject_id).is_none() {
            self.order.push_back(message_id);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.subjects.remove(&oldest);
            }
        }
    }

    pub fn get(&self, message_id: MessageId) -> Option<SubjectId> {
        self.subjects.get(&message_id).copied()
    }

    /// Fill in a missing subject from memory, or remember a known one.
    pub fn resolve(&mut self, incoming: &mut IncomingMessage) {
        match incoming.mentioned_subject_id {
            Some(subject_id) => self.remember(incoming.message_id, subject_id),
            None => incoming.mentioned_subject_id = self.get(incoming.message_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snowflake_time() {
        assert_eq!(snowflake_time(0), Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()));
        // 2016-04-30T11:18:25.796Z
        assert_eq!(
            snowflake_time(175928847299117063).map(|t| t.timestamp_millis()),
            Some(1_462_015_105_796)
        );
        assert!(snowflake_time(200 << 22) < snowflake_time(201 << 22));
    }

    #[test]
    fn test_recent_subjects_fill_edits() {
        let mut recent = RecentSubjects::new(8);
        let mut created = IncomingMessage {
            message_id: 10,
            mentioned_subject_id: Some(77),
            ..Default::default()
        };
        recent.resolve(&mut created);

        let mut edited = IncomingMessage {
            message_id: 10,
            ..Default::default()
        };
        recent.resolve(&mut edited);
        assert_eq!(edited.mentioned_subject_id, Some(77));

        let mut unknown = IncomingMessage {
            message_id: 11,
            ..Default::default()
        };
        recent.resolve(&mut unknown);
        assert_eq!(unknown.mentioned_subject_id, None);
    }

    #[test]
    fn test_recent_subjects_bounded() {
        let mut recent = RecentSubjects::new(2);
        recent.remember(1, 100);
        recent.remember(2, 200);
        recent.remember(3, 300);
        assert_eq!(recent.get(1), None);
        assert_eq!(recent.get(2), Some(200));
        assert_eq!(recent.get(3), Some(300));
    }
}
