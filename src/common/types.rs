//! Shared types used across the application.

use serde::{Deserialize, Serialize};

/// Discord user id of a tracked subject.
pub type SubjectId = u64;

/// Discord message id.
pub type MessageId = u64;

/// Mini-games played through the tracked bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Game {
    CoinFlip,
    Slots,
    Blackjack,
}

impl Game {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CoinFlip => "coinflip",
            Self::Slots => "slots",
            Self::Blackjack => "blackjack",
        }
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a message announces a wager or its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Placement,
    Resolution,
}
