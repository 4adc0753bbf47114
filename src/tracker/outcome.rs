//! Stake extraction and outcome evaluation.
//!
//! Each game encodes its result differently:
//! - coin-flip: binary, the net result equals the stake
//! - slots: the message states a total payout, compared against the stake
//! - blackjack: the message states the net amount directly

use fancy_regex::Regex;
use tracing::warn;

use crate::common::types::Game;
use crate::tracker::amount::{parse_first_amount, parse_last_amount};
use crate::tracker::session::PendingBet;

/// How a resolution was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Loss,
    /// Tie, push, double bust or break-even.
    Push,
    /// No marker or amount could be read; nothing is recorded.
    Unrecognized,
}

/// Gain/loss delta produced by one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub gain: u64,
    pub loss: u64,
    pub verdict: Verdict,
}

impl Outcome {
    pub fn win(gain: u64) -> Self {
        Self { gain, loss: 0, verdict: Verdict::Win }
    }

    pub fn lose(loss: u64) -> Self {
        Self { gain: 0, loss, verdict: Verdict::Loss }
    }

    pub fn push() -> Self {
        Self { gain: 0, loss: 0, verdict: Verdict::Push }
    }

    pub fn unrecognized() -> Self {
        Self { gain: 0, loss: 0, verdict: Verdict::Unrecognized }
    }
}

/// Evaluator with precompiled outcome markers.
#[derive(Debug, Clone)]
pub struct OutcomeEvaluator {
    coin_stake: Regex,
    coin_won: Regex,
    coin_lost: Regex,
    slot_stake: Regex,
    /// Used when the wager is not followed by the currency emoji.
    slot_stake_fallback: Regex,
    slot_won: Regex,
    slot_lost_all: Regex,
    slot_push: Regex,
    card_stake: Regex,
    card_won: Regex,
    card_lost: Regex,
    card_push: Regex,
}

impl Default for OutcomeEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeEvaluator {
    pub fn new() -> Self {
        Self {
            coin_stake: Regex::new(r"\bspent\b").unwrap(),
            coin_won: Regex::new(r"\byou won\b").unwrap(),
            coin_lost: Regex::new(r"\byou lost\b").unwrap(),
            slot_stake: Regex::new(r"\bbet :cowoncy:").unwrap(),
            slot_stake_fallback: Regex::new(r"___slots___.*?\bbet\b").unwrap(),
            slot_won: Regex::new(r"\band won\b").unwrap(),
            slot_lost_all: Regex::new(r"\band lost it all\b").unwrap(),
            slot_push: Regex::new(r"\band (?:it'?s a )?(?:tie|tied|push|pushed)\b").unwrap(),
            card_stake: Regex::new(r"\byou bet\b").unwrap(),
            card_won: Regex::new(r"\byou won\b").unwrap(),
            card_lost: Regex::new(r"\byou lost\b").unwrap(),
            card_push: Regex::new(r"\byou (?:tied|pushed)\b|\byou both bust\b").unwrap(),
        }
    }

    /// Wager stated by a placement, if any.
    pub fn stake(&self, game: Game, text: &str) -> Option<u64> {
        let tail = match game {
            Game::CoinFlip => tail_after(&self.coin_stake, text),
            Game::Slots => tail_after(&self.slot_stake, text)
                .or_else(|| tail_after(&self.slot_stake_fallback, text)),
            Game::Blackjack => tail_after(&self.card_stake, text),
        };
        tail.and_then(parse_first_amount)
    }

    /// Evaluate a resolution against its pending bet.
    pub fn evaluate(&self, game: Game, text: &str, pending: &PendingBet) -> Outcome {
        match game {
            Game::CoinFlip => self.evaluate_coinflip(text, pending.amount),
            Game::Slots => self.evaluate_slots(text, pending.amount),
            Game::Blackjack => self.evaluate_blackjack(text),
        }
    }

    fn evaluate_coinflip(&self, text: &str, stake: u64) -> Outcome {
        if found(&self.coin_won, text) {
            Outcome::win(stake)
        } else if found(&self.coin_lost, text) {
            Outcome::lose(stake)
        } else {
            Outcome::unrecognized()
        }
    }

    fn evaluate_slots(&self, text: &str, stake: u64) -> Outcome {
        if found(&self.slot_push, text) {
            return Outcome::push();
        }

        let payout = if found(&self.slot_lost_all, text) {
            Some(0)
        } else if let Some(tail) = tail_after(&self.slot_won, text) {
            match parse_last_amount(tail) {
                Some(amount) => Some(amount),
                None if tail.trim_start().starts_with("nothing") => Some(0),
                None => None,
            }
        } else {
            None
        };

        match payout {
            Some(payout) if payout > stake => Outcome::win(payout - stake),
            Some(payout) if payout == stake => Outcome::push(),
            Some(payout) => Outcome::lose(stake - payout),
            None => Outcome::unrecognized(),
        }
    }

    fn evaluate_blackjack(&self, text: &str) -> Outcome {
        if found(&self.card_push, text) {
            return Outcome::push();
        }
        if let Some(tail) = tail_after(&self.card_won, text) {
            return parse_first_amount(tail).map_or_else(Outcome::unrecognized, Outcome::win);
        }
        if let Some(tail) = tail_after(&self.card_lost, text) {
            return parse_first_amount(tail).map_or_else(Outcome::unrecognized, Outcome::lose);
        }
        Outcome::unrecognized()
    }
}

/// Text following the first match of `marker`.
fn tail_after<'t>(marker: &Regex, text: &'t str) -> Option<&'t str> {
    match marker.find(text) {
        Ok(Some(m)) => Some(&text[m.end()..]),
        Ok(None) => None,
        Err(e) => {
            warn!("Outcome marker error: {}", e);
            None
        }
    }
}

fn found(marker: &Regex, text: &str) -> bool {
    tail_after(marker, text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bet(game: Game, amount: u64) -> PendingBet {
        PendingBet {
            game,
            amount,
            placed_at: Utc::now(),
            source: 1,
        }
    }

    fn eval(game: Game, text: &str, stake: u64) -> Outcome {
        OutcomeEvaluator::new().evaluate(game, text, &bet(game, stake))
    }

    #[test]
    fn test_stakes() {
        let evaluator = OutcomeEvaluator::new();
        assert_eq!(
            evaluator.stake(Game::CoinFlip, "user42 spent :cowoncy: 1,000 and chose heads"),
            Some(1000)
        );
        assert_eq!(evaluator.stake(Game::Slots, "___slots___ betty bet :cowoncy: 500"), Some(500));
        assert_eq!(
            evaluator.stake(Game::Blackjack, "user, you bet 1000 to play blackjack"),
            Some(1000)
        );
        assert_eq!(evaluator.stake(Game::Slots, "___slots___ bet :cowoncy:"), None);
    }

    #[test]
    fn test_coinflip_conservation() {
        for stake in [0, 1, 100, 250_000] {
            assert_eq!(eval(Game::CoinFlip, "the coin spins... and you won 999", stake), Outcome::win(stake));
            assert_eq!(eval(Game::CoinFlip, "and you lost it all... :c", stake), Outcome::lose(stake));
        }
        assert_eq!(eval(Game::CoinFlip, "the coin spins...", 100), Outcome::unrecognized());
    }

    #[test]
    fn test_slot_payouts() {
        assert_eq!(eval(Game::Slots, "and lost it all... :c", 500), Outcome::lose(500));
        assert_eq!(eval(Game::Slots, "and won nothing... :c", 500), Outcome::lose(500));
        assert_eq!(eval(Game::Slots, "bet 200 and won :cowoncy: 350", 200), Outcome::win(150));
        assert_eq!(eval(Game::Slots, "and won 0", 300), Outcome::lose(300));
        assert_eq!(eval(Game::Slots, "and won 100", 300), Outcome::lose(200));
        assert_eq!(eval(Game::Slots, "and won", 300), Outcome::unrecognized());
        assert_eq!(eval(Game::Slots, "and it's a push", 300), Outcome::push());
    }

    #[test]
    fn test_player_names_do_not_change_outcomes() {
        let evaluator = OutcomeEvaluator::new();
        assert_eq!(
            evaluator.stake(Game::Slots, "___slots___ bet 7 bet :cowoncy: 500"),
            Some(500)
        );
        assert_eq!(evaluator.stake(Game::Slots, "___slots___ player bet 250"), Some(250));

        let tie_loses = "___slots___ tie bet :cowoncy: 500 | and lost it all... :c";
        assert_eq!(eval(Game::Slots, tie_loses, 500), Outcome::lose(500));
        let push_wins = "___slots___ push bet :cowoncy: 500 and won :cowoncy: 800";
        assert_eq!(eval(Game::Slots, push_wins, 500), Outcome::win(300));
        assert_eq!(
            eval(Game::Blackjack, "push, you bet 1000 to play blackjack ~ you lost 1000", 1000),
            Outcome::lose(1000)
        );
    }

    #[test]
    fn test_slot_break_even() {
        for stake in [0, 1, 500, 1_000_000] {
            let text = format!("and won :cowoncy: {}", stake);
            let outcome = eval(Game::Slots, &text, stake);
            assert_eq!((outcome.gain, outcome.loss), (0, 0));
            assert_eq!(outcome.verdict, Verdict::Push);
        }
    }

    #[test]
    fn test_blackjack_reads_net_directly() {
        let placed = "you bet 1000 to play blackjack";
        assert_eq!(eval(Game::Blackjack, &format!("{} ~ you won 1500", placed), 1000), Outcome::win(1500));
        assert_eq!(eval(Game::Blackjack, &format!("{} ~ you lost 1000", placed), 1000), Outcome::lose(1000));
        assert_eq!(eval(Game::Blackjack, &format!("{} ~ you tied", placed), 1000), Outcome::push());
        assert_eq!(eval(Game::Blackjack, "you both bust", 1000), Outcome::push());
        assert_eq!(eval(Game::Blackjack, "you won", 1000), Outcome::unrecognized());
    }
}
