//! Error types for the application.

use thiserror::Error;

use crate::common::types::SubjectId;

/// Errors returned by session lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("Subject {subject_id} already has an active session")]
    AlreadyActive { subject_id: SubjectId },

    #[error("Subject {subject_id} has no active session")]
    NoActiveSession { subject_id: SubjectId },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    IoError { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Session store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session store is closed")]
    Closed,

    #[error("Failed to write session store '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize session record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Notifier errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel is closed")]
    Closed,
}

/// Discord-related errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Failed to register commands: {0}")]
    CommandRegistration(#[source] serenity::Error),

    #[error("Failed to send message: {0}")]
    SendFailed(#[source] serenity::Error),

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Result type alias for Discord operations.
pub type DiscordResult<T> = std::result::Result<T, DiscordError>;
