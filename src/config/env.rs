//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `WINNINGTRACK_DISCORD_TOKEN` - Discord bot token
//! - `WINNINGTRACK_DISCORD_GUILD_ID` - Guild for slash command registration
//! - `WINNINGTRACK_ANNOUNCE_CHANNEL` - Channel for session announcements
//! - `WINNINGTRACK_BOT_ID` - User id of the tracked game bot
//! - `WINNINGTRACK_STORE_PATH` - Session store file

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "WINNINGTRACK";

/// Apply environment variable overrides to a config.
///
/// This allows the token to be provided via the environment instead of
/// the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }

    if let Ok(guild_id) = env::var(format!("{}_DISCORD_GUILD_ID", ENV_PREFIX)) {
        if let Ok(id) = guild_id.parse() {
            config.discord.guild_id = Some(id);
        }
    }
    if let Ok(channel) = env::var(format!("{}_ANNOUNCE_CHANNEL", ENV_PREFIX)) {
        if let Ok(id) = channel.parse() {
            config.discord.announce_channel = Some(id);
        }
    }

    if let Ok(bot_id) = env::var(format!("{}_BOT_ID", ENV_PREFIX)) {
        if let Ok(id) = bot_id.parse() {
            config.tracker.bot_id = id;
        }
    }

    if let Ok(path) = env::var(format!("{}_STORE_PATH", ENV_PREFIX)) {
        config.store.path = path;
    }

    config
}

/// Check if any required environment variables are set but empty.
///
/// Returns a list of variable names that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [format!("{}_DISCORD_TOKEN", ENV_PREFIX)];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `WINNINGTRACK_CONFIG` environment variable, otherwise returns "winningtrack.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "winningtrack.conf".to_string())
}
