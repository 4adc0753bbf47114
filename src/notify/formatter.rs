//! Announcement formatting for display.
//!
//! Handles placeholder substitution in announcement format strings.
//! Supports placeholders: %user, %time, %gain, %loss, %net, %bets, %duration

use chrono::{DateTime, Local, Utc};

use crate::common::messages::{Notification, SessionSummary};

/// Default format for session start announcements.
pub const DEFAULT_SESSION_STARTED_FORMAT: &str = "New session started! Tracking initialized.";

/// Default format for session result announcements.
pub const DEFAULT_SESSION_ENDED_FORMAT: &str =
    "**Session Result:**\nLost: `%loss`\nWon: `%gain`\nNet: `%net`";

/// Formatter for session lifecycle announcements.
#[derive(Debug, Clone)]
pub struct AnnouncementFormatter {
    started: String,
    ended: String,
}

impl Default for AnnouncementFormatter {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl AnnouncementFormatter {
    /// Create a formatter, falling back to the default formats.
    pub fn new(started: Option<String>, ended: Option<String>) -> Self {
        Self {
            started: started.unwrap_or_else(|| DEFAULT_SESSION_STARTED_FORMAT.to_string()),
            ended: ended.unwrap_or_else(|| DEFAULT_SESSION_ENDED_FORMAT.to_string()),
        }
    }

    /// Format a notification; `user` is the subject's display form (name or mention).
    pub fn format(&self, notification: &Notification, user: &str) -> String {
        match notification {
            Notification::SessionStarted { started_at, .. } => self
                .started
                .replace("%user", user)
                .replace("%time", &local_time(started_at)),
            Notification::SessionEnded(summary) => self.format_summary(summary, user),
        }
    }

    /// Format a finished session.
    pub fn format_summary(&self, summary: &SessionSummary, user: &str) -> String {
        self.ended
            .replace("%user", user)
            .replace("%time", &local_time(&summary.ended_at))
            .replace("%gain", &group_digits(false, summary.total_gain))
            .replace("%loss", &group_digits(false, summary.total_loss))
            .replace("%net", &group_thousands(summary.net_gain))
            .replace("%bets", &summary.bets_resolved.to_string())
            .replace(
                "%duration",
                &format_duration(summary.ended_at - summary.started_at),
            )
    }
}

/// Render `value` with `,` thousands separators, keeping the sign.
pub fn group_thousands(value: i64) -> String {
    group_digits(value < 0, value.unsigned_abs())
}

fn group_digits(negative: bool, magnitude: u64) -> String {
    let digits = magnitude.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Compact duration such as `1h 05m`, `12m 30s` or `45s`.
pub fn format_duration(duration: chrono::Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(gain: u64, loss: u64) -> SessionSummary {
        let started_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        SessionSummary {
            subject_id: 42,
            started_at,
            ended_at: started_at + chrono::Duration::seconds(3900),
            total_gain: gain,
            total_loss: loss,
            net_gain: gain as i64 - loss as i64,
            bets_resolved: 4,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-25_000), "-25,000");
        assert_eq!(group_thousands(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_huge_totals_keep_their_sign() {
        let formatter = AnnouncementFormatter::new(None, Some("%gain %loss %net".to_string()));
        let mut huge = summary(u64::MAX, 0);
        huge.net_gain = i64::MAX;
        assert_eq!(
            formatter.format_summary(&huge, "<@42>"),
            "18,446,744,073,709,551,615 0 9,223,372,036,854,775,807"
        );
    }

    #[test]
    fn test_default_result_format() {
        let formatter = AnnouncementFormatter::default();
        assert_eq!(
            formatter.format_summary(&summary(1500, 4000), "<@42>"),
            "**Session Result:**\nLost: `4,000`\nWon: `1,500`\nNet: `-2,500`"
        );
    }

    #[test]
    fn test_custom_formats() {
        let formatter = AnnouncementFormatter::new(
            Some("%user is now tracked".to_string()),
            Some("%user: %net over %bets bets in %duration".to_string()),
        );
        let started = Notification::SessionStarted {
            subject_id: 42,
            started_at: Utc::now(),
        };
        assert_eq!(formatter.format(&started, "Player"), "Player is now tracked");
        assert_eq!(
            formatter.format(&Notification::SessionEnded(summary(3000, 1000)), "Player"),
            "Player: 2,000 over 4 bets in 1h 05m"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(chrono::Duration::seconds(45)), "45s");
        assert_eq!(format_duration(chrono::Duration::seconds(750)), "12m 30s");
        assert_eq!(format_duration(chrono::Duration::seconds(-5)), "0s");
    }
}
