//! Amount extraction from free text.
//!
//! Grouping commas are removed before scanning, so `1,000,000` reads as a
//! single run. A missing amount is `None`, never zero.

use std::sync::OnceLock;

use fancy_regex::Regex;
use tracing::warn;

fn digit_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("digit run pattern is valid"))
}

/// All amounts in `text`, in order of appearance.
///
/// Runs that overflow `u64` are skipped.
pub fn amounts(text: &str) -> Vec<u64> {
    let stripped = text.replace(',', "");
    digit_runs()
        .find_iter(&stripped)
        .filter_map(|m| match m {
            Ok(m) => m.as_str().parse::<u64>().ok(),
            Err(e) => {
                warn!("Amount scan failed: {}", e);
                None
            }
        })
        .collect()
}

/// The first amount in `text`. Used where the wager is stated early.
pub fn parse_first_amount(text: &str) -> Option<u64> {
    amounts(text).into_iter().next()
}

/// The last amount in `text`. Used where a payout closes the sentence.
pub fn parse_last_amount(text: &str) -> Option<u64> {
    amounts(text).into_iter().last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_amount() {
        assert_eq!(parse_first_amount("bet 1,250,000 now"), Some(1_250_000));
    }

    #[test]
    fn test_first_and_last() {
        let text = "spent 100 and chose heads... and you won 200";
        assert_eq!(parse_first_amount(text), Some(100));
        assert_eq!(parse_last_amount(text), Some(200));
    }

    #[test]
    fn test_absent_is_not_zero() {
        assert_eq!(parse_first_amount("and won nothing"), None);
        assert_eq!(parse_last_amount(""), None);
        assert_eq!(parse_first_amount("0"), Some(0));
    }

    #[test]
    fn test_overflow_is_skipped() {
        assert_eq!(parse_first_amount("99999999999999999999999 then 7"), Some(7));
    }
}
