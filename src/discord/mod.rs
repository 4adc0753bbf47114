//! Discord bot integration.
//!
//! Feeds game bot messages into the tracker and exposes the session
//! commands to users.

pub mod client;
pub mod commands;
pub mod handler;
pub mod payload;
pub mod rescan;

// Re-export main types for external use
pub use client::{DiscordBotBuilder, DiscordChannels};
