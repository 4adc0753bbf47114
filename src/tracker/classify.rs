//! Game classification.
//!
//! Decides which game a normalized message belongs to and whether it is a
//! placement or a resolution. Priority is fixed: blackjack, then slots, then
//! coin-flip. Slot and blackjack messages can both contain the word "bet",
//! so the card-game check runs first.
//!
//! The player's display name is part of the text, so every marker is
//! anchored to the game's own phrasing rather than a bare keyword.

use fancy_regex::Regex;
use tracing::warn;

use crate::common::types::{Game, Phase};

/// Result of classifying a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub game: Game,
    pub phase: Phase,
}

/// Lexical markers for one game.
#[derive(Debug, Clone)]
struct GameMarkers {
    game: Game,
    /// Presence of any of these routes the message to this game.
    detect: Vec<&'static str>,
    detect_pattern: Option<Regex>,
    resolution: Regex,
    placement: Regex,
}

/// Message classifier with precompiled markers.
#[derive(Debug, Clone)]
pub struct Classifier {
    blackjack: GameMarkers,
    slots: GameMarkers,
    coinflip: GameMarkers,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            blackjack: GameMarkers {
                game: Game::Blackjack,
                detect: Vec::new(),
                detect_pattern: None,
                resolution: Regex::new(r"\byou (?:won|lost|tied|pushed)\b|\byou both bust\b")
                    .unwrap(),
                placement: Regex::new(r"\byou bet\b|\bto play blackjack\b").unwrap(),
            },
            slots: GameMarkers {
                game: Game::Slots,
                detect: vec!["___slots___"],
                detect_pattern: Some(Regex::new(r"\band (?:won|lost it all)\b").unwrap()),
                resolution: Regex::new(
                    r"\band (?:won|lost it all)\b|\band (?:it'?s a )?(?:tie|tied|push|pushed)\b",
                )
                .unwrap(),
                placement: Regex::new(r"___slots___.*?\bbet\b").unwrap(),
            },
            coinflip: GameMarkers {
                game: Game::CoinFlip,
                detect: vec!["spent", "chose", "the coin spins"],
                detect_pattern: None,
                resolution: Regex::new(r"\byou (?:won|lost)\b").unwrap(),
                placement: Regex::new(r"\bspent\b").unwrap(),
            },
        }
    }

    /// Classify a normalized message.
    ///
    /// Returns `None` for chatter and unrelated bot output.
    pub fn classify(&self, text: &str, has_card_markers: bool) -> Option<Classification> {
        if has_card_markers {
            return phase_of(&self.blackjack, text);
        }
        if detects(&self.slots, text) {
            return phase_of(&self.slots, text);
        }
        if detects(&self.coinflip, text) {
            return phase_of(&self.coinflip, text);
        }
        None
    }
}

fn detects(markers: &GameMarkers, text: &str) -> bool {
    markers.detect.iter().any(|m| text.contains(m))
        || markers
            .detect_pattern
            .as_ref()
            .is_some_and(|p| matches(p, text))
}

fn phase_of(markers: &GameMarkers, text: &str) -> Option<Classification> {
    let phase = if matches(&markers.resolution, text) {
        Phase::Resolution
    } else if matches(&markers.placement, text) {
        Phase::Placement
    } else {
        return None;
    };
    Some(Classification {
        game: markers.game,
        phase,
    })
}

fn matches(pattern: &Regex, text: &str) -> bool {
    pattern.is_match(text).unwrap_or_else(|e| {
        warn!("Classifier match error: {}", e);
        false
    })
}
