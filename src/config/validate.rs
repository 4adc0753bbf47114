//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Discord
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.guild_id == Some(0) {
        errors.push("discord.guild_id must be non-zero".to_string());
    }
    if config.discord.announce_channel == Some(0) {
        errors.push("discord.announce_channel must be non-zero".to_string());
    }

    // Tracker
    if config.tracker.bot_id == 0 {
        errors.push("tracker.bot_id must be non-zero".to_string());
    }
    if config.tracker.processed_capacity == 0 {
        errors.push("tracker.processed_capacity must be at least 1".to_string());
    }
    if config.tracker.stale_bet_secs == Some(0) {
        errors.push("tracker.stale_bet_secs must be non-zero (omit it to disable eviction)".to_string());
    }

    // Rescan
    if config.rescan.enabled {
        if config.rescan.interval_secs == 0 {
            errors.push("rescan.interval_secs must be non-zero".to_string());
        }
        if config.rescan.history_limit == 0 || config.rescan.history_limit > 100 {
            errors.push(format!(
                "rescan.history_limit must be 1-100 (got {})",
                config.rescan.history_limit
            ));
        }
    }

    // Store
    if config.store.path.trim().is_empty() {
        errors.push("store.path is required".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_valid_config() -> Config {
        Config {
            discord: DiscordConfig {
                token: "valid_token_here".to_string(),
                guild_id: Some(123456789),
                announce_channel: None,
                enable_text_commands: true,
            },
            tracker: TrackerConfig::default(),
            rescan: RescanConfig::default(),
            store: StoreConfig::default(),
            messages: MessagesConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&make_valid_config()).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = String::new();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("discord.token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = "YOUR_DISCORD_TOKEN_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_zero_capacity_fails() {
        let mut config = make_valid_config();
        config.tracker.processed_capacity = 0;

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("processed_capacity"));
    }

    #[test]
    fn test_rescan_checked_only_when_enabled() {
        let mut config = make_valid_config();
        config.rescan.history_limit = 0;
        assert!(validate_config(&config).is_ok());

        config.rescan.enabled = true;
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("history_limit"));
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = make_valid_config();
        config.discord.token = String::new();
        config.tracker.bot_id = 0;
        config.store.path = " ".to_string();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("discord.token"));
        assert!(message.contains("tracker.bot_id"));
        assert!(message.contains("store.path"));
    }
}
