//! Configuration type definitions.

use serde::Deserialize;

/// User id of the OwO game bot.
pub const DEFAULT_TRACKED_BOT_ID: u64 = 408785106942164992;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub rescan: RescanConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    /// Register slash commands on this guild only (instant) instead of globally.
    pub guild_id: Option<u64>,
    /// Channel that receives session start/result announcements.
    pub announce_channel: Option<u64>,
    #[serde(default = "default_true")]
    pub enable_text_commands: bool,
}

/// Correlation engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_bot_id")]
    pub bot_id: u64,
    #[serde(default = "default_processed_capacity")]
    pub processed_capacity: usize,
    /// Discard pending bets older than this many seconds.
    pub stale_bet_secs: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bot_id: default_bot_id(),
            processed_capacity: default_processed_capacity(),
            stale_bet_secs: None,
        }
    }
}

/// Periodic re-scan of recent channel history.
#[derive(Debug, Clone, Deserialize)]
pub struct RescanConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rescan_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: u8,
}

impl Default for RescanConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_rescan_interval(),
            history_limit: default_history_limit(),
        }
    }
}

/// Session persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Announcement format overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesConfig {
    pub session_started: Option<String>,
    pub session_ended: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_bot_id() -> u64 {
    DEFAULT_TRACKED_BOT_ID
}

fn default_processed_capacity() -> usize {
    1024
}

fn default_rescan_interval() -> u64 {
    30
}

fn default_history_limit() -> u8 {
    25
}

fn default_store_path() -> String {
    "sessions.jsonl".to_string()
}
