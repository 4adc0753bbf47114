//! Per-subject session state.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::common::messages::SessionSummary;
use crate::common::types::{Game, MessageId, SubjectId};
use crate::tracker::outcome::Outcome;

/// Running totals for one tracked subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSession {
    pub subject_id: SubjectId,
    pub started_at: DateTime<Utc>,
    pub total_gain: u64,
    pub total_loss: u64,
    pub bets_resolved: u32,
}

impl TrackedSession {
    pub fn new(subject_id: SubjectId, started_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            started_at,
            total_gain: 0,
            total_loss: 0,
            bets_resolved: 0,
        }
    }

    /// Net result, always derived from the two accumulators.
    ///
    /// Clamps to the `i64` range.
    pub fn net_gain(&self) -> i64 {
        if self.total_gain >= self.total_loss {
            i64::try_from(self.total_gain - self.total_loss).unwrap_or(i64::MAX)
        } else {
            i64::try_from(self.total_loss - self.total_gain)
                .map(|v| -v)
                .unwrap_or(i64::MIN)
        }
    }

    /// Fold a resolution's delta into the totals.
    pub fn apply(&mut self, outcome: &Outcome) {
        self.total_gain = self.total_gain.saturating_add(outcome.gain);
        self.total_loss = self.total_loss.saturating_add(outcome.loss);
        self.bets_resolved += 1;
    }

    pub fn summarize(&self, ended_at: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            subject_id: self.subject_id,
            started_at: self.started_at,
            ended_at,
            total_gain: self.total_gain,
            total_loss: self.total_loss,
            net_gain: self.net_gain(),
            bets_resolved: self.bets_resolved,
        }
    }
}

/// A placement awaiting its resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBet {
    pub game: Game,
    pub amount: u64,
    pub placed_at: DateTime<Utc>,
    /// Message that announced the wager.
    pub source: MessageId,
}

impl PendingBet {
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Option<chrono::Duration>) -> bool {
        max_age.is_some_and(|age| now - self.placed_at > age)
    }
}

/// Bounded set of message ids already folded into totals.
///
/// When full, the oldest id is evicted first.
#[derive(Debug, Clone)]
pub struct ProcessedMessages {
    capacity: usize,
    order: VecDeque<MessageId>,
    ids: HashSet<MessageId>,
}

impl ProcessedMessages {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
        }
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.ids.contains(&id)
    }

    /// Record `id`. Returns false if it was already present.
    pub fn insert(&mut self, id: MessageId) -> bool {
        if !self.ids.insert(id) {
            return false;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.ids.remove(&evicted);
            }
        }
        true
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_gain_is_derived() {
        let mut session = TrackedSession::new(7, Utc::now());
        session.apply(&Outcome::win(300));
        session.apply(&Outcome::lose(500));
        assert_eq!(session.net_gain(), -200);
        assert_eq!(session.bets_resolved, 2);

        let summary = session.summarize(Utc::now());
        assert_eq!(summary.net_gain, -200);
    }

    #[test]
    fn test_net_gain_clamps() {
        let mut session = TrackedSession::new(7, Utc::now());
        session.apply(&Outcome::win(u64::MAX));
        assert_eq!(session.total_gain, u64::MAX);
        assert_eq!(session.net_gain(), i64::MAX);

        let mut session = TrackedSession::new(7, Utc::now());
        session.apply(&Outcome::lose(u64::MAX));
        assert_eq!(session.net_gain(), i64::MIN);

        session.apply(&Outcome::win(u64::MAX - 10));
        assert_eq!(session.net_gain(), -10);
    }

    #[test]
    fn test_processed_eviction() {
        let mut processed = ProcessedMessages::new(2);
        assert!(processed.insert(1));
        assert!(!processed.insert(1));
        assert!(processed.insert(2));
        assert!(processed.insert(3));
        assert!(!processed.contains(1));
        assert!(processed.contains(2));
        assert!(processed.contains(3));
        assert_eq!(processed.len(), 2);
    }

    #[test]
    fn test_staleness() {
        let now = Utc::now();
        let bet = PendingBet {
            game: Game::Slots,
            amount: 10,
            placed_at: now - chrono::Duration::seconds(120),
            source: 1,
        };
        assert!(!bet.is_stale(now, None));
        assert!(bet.is_stale(now, Some(chrono::Duration::seconds(60))));
        assert!(!bet.is_stale(now, Some(chrono::Duration::seconds(300))));
    }
}
