//! Correlation engine and session lifecycle.
//!
//! `SessionManager` owns every tracked subject's state. Each message runs a
//! short synchronous transition:
//!
//! 1. gate: tracked bot, known subject, active session, posted after the
//!    session started, not yet processed
//! 2. normalize and classify
//! 3. placement: arm (or overwrite) the pending bet for that game
//! 4. resolution: evaluate against the pending bet, fold into totals,
//!    clear the bet and mark the messages processed
//!
//! Per game the state is `idle -> awaiting resolution -> idle`. A resolution
//! seen while idle changes nothing, even when it restates its wager.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::common::error::TrackerError;
use crate::common::messages::{IncomingMessage, Notification, SessionSummary};
use crate::common::types::{Game, MessageId, Phase, SubjectId};
use crate::notify::Notifier;
use crate::store::SessionStore;
use crate::tracker::classify::Classifier;
use crate::tracker::normalize::Normalizer;
use crate::tracker::outcome::{Outcome, OutcomeEvaluator};
use crate::tracker::session::{PendingBet, ProcessedMessages, TrackedSession};

/// Default bound on remembered message ids per session.
pub const DEFAULT_PROCESSED_CAPACITY: usize = 1024;

/// Tunables for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub processed_capacity: usize,
    /// Pending bets older than this are discarded on the next lookup.
    pub stale_after: Option<chrono::Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            processed_capacity: DEFAULT_PROCESSED_CAPACITY,
            stale_after: None,
        }
    }
}

/// Why a message left no trace on the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotTrackedBot,
    NoSubject,
    NoActiveSession,
    /// Posted before the subject's session started.
    PredatesSession,
    Duplicate,
    Unclassifiable,
    UnmatchedResolution,
    MalformedAmount,
}

/// Result of processing one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Ignored(IgnoreReason),
    BetPlaced {
        game: Game,
        amount: u64,
        replaced: bool,
    },
    Resolved {
        game: Game,
        outcome: Outcome,
    },
}

/// Everything held for one subject while a session is active.
#[derive(Debug)]
struct SubjectState {
    session: TrackedSession,
    pending: HashMap<Game, PendingBet>,
    processed: ProcessedMessages,
}

impl SubjectState {
    fn new(subject_id: SubjectId, now: DateTime<Utc>, capacity: usize) -> Self {
        Self {
            session: TrackedSession::new(subject_id, now),
            pending: HashMap::new(),
            processed: ProcessedMessages::new(capacity),
        }
    }

    /// Look up the pending bet for `game`, evicting it first if stale.
    fn take_pending(
        &mut self,
        game: Game,
        now: DateTime<Utc>,
        stale_after: Option<chrono::Duration>,
    ) -> Option<PendingBet> {
        let bet = self.pending.remove(&game)?;
        if bet.is_stale(now, stale_after) {
            debug!(
                subject = self.session.subject_id,
                %game,
                amount = bet.amount,
                "Discarding stale pending bet"
            );
            return None;
        }
        Some(bet)
    }
}

/// Owns all tracked sessions and drives the correlation state machine.
pub struct SessionManager {
    settings: EngineSettings,
    normalizer: Normalizer,
    classifier: Classifier,
    evaluator: OutcomeEvaluator,
    subjects: HashMap<SubjectId, SubjectState>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl SessionManager {
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            normalizer: Normalizer::new(),
            classifier: Classifier::new(),
            evaluator: OutcomeEvaluator::new(),
            subjects: HashMap::new(),
            store,
            notifier,
        }
    }

    pub fn is_tracking(&self, subject_id: SubjectId) -> bool {
        self.subjects.contains_key(&subject_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.subjects.len()
    }

    /// Current running totals for a subject.
    pub fn session(&self, subject_id: SubjectId) -> Option<&TrackedSession> {
        self.subjects.get(&subject_id).map(|s| &s.session)
    }

    /// Pending bet for a subject and game, if armed.
    pub fn pending_bet(&self, subject_id: SubjectId, game: Game) -> Option<&PendingBet> {
        self.subjects.get(&subject_id)?.pending.get(&game)
    }

    /// Start tracking a subject.
    #[cfg(test)]
    pub fn start_tracking(&mut self, subject_id: SubjectId) -> Result<DateTime<Utc>, TrackerError> {
        self.start_tracking_at(subject_id, Utc::now())
    }

    pub fn start_tracking_at(
        &mut self,
        subject_id: SubjectId,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, TrackerError> {
        if self.subjects.contains_key(&subject_id) {
            return Err(TrackerError::AlreadyActive { subject_id });
        }

        self.subjects.insert(
            subject_id,
            SubjectState::new(subject_id, now, self.settings.processed_capacity),
        );
        info!(subject = subject_id, "Session started");

        if let Err(e) = self.notifier.notify(Notification::SessionStarted {
            subject_id,
            started_at: now,
        }) {
            warn!("Failed to announce session start for {}: {}", subject_id, e);
        }

        Ok(now)
    }

    /// Stop tracking a subject and emit its summary.
    #[cfg(test)]
    pub fn end_tracking(&mut self, subject_id: SubjectId) -> Result<SessionSummary, TrackerError> {
        self.end_tracking_at(subject_id, Utc::now())
    }

    pub fn end_tracking_at(
        &mut self,
        subject_id: SubjectId,
        now: DateTime<Utc>,
    ) -> Result<SessionSummary, TrackerError> {
        let state = self
            .subjects
            .remove(&subject_id)
            .ok_or(TrackerError::NoActiveSession { subject_id })?;

        if !state.pending.is_empty() {
            debug!(
                subject = subject_id,
                pending = state.pending.len(),
                "Dropping unresolved bets at session end"
            );
        }

        let summary = state.session.summarize(now);
        info!(
            subject = subject_id,
            gain = summary.total_gain,
            loss = summary.total_loss,
            net = summary.net_gain,
            bets = summary.bets_resolved,
            "Session ended"
        );

        if let Err(e) = self.notifier.notify(Notification::SessionEnded(summary.clone())) {
            warn!("Failed to announce session result for {}: {}", subject_id, e);
        }
        if let Err(e) = self.store.persist(summary.clone()) {
            warn!("Failed to hand session for {} to the store: {}", subject_id, e);
        }

        Ok(summary)
    }

    /// Process one message from the message source.
    pub fn process(&mut self, message: &IncomingMessage) -> ProcessOutcome {
        self.process_at(message, Utc::now())
    }

    pub fn process_at(&mut self, message: &IncomingMessage, now: DateTime<Utc>) -> ProcessOutcome {
        if !message.author_is_tracked_bot {
            return ProcessOutcome::Ignored(IgnoreReason::NotTrackedBot);
        }
        let Some(subject_id) = message.mentioned_subject_id else {
            return ProcessOutcome::Ignored(IgnoreReason::NoSubject);
        };
        let Some(state) = self.subjects.get_mut(&subject_id) else {
            return ProcessOutcome::Ignored(IgnoreReason::NoActiveSession);
        };
        if message
            .created_at
            .is_some_and(|created| created < state.session.started_at)
        {
            debug!(subject = subject_id, message_id = message.message_id, "Skipping message from before the session");
            return ProcessOutcome::Ignored(IgnoreReason::PredatesSession);
        }
        if state.processed.contains(message.message_id) {
            debug!(subject = subject_id, message_id = message.message_id, "Skipping processed message");
            return ProcessOutcome::Ignored(IgnoreReason::Duplicate);
        }

        let normalized = self.normalizer.normalize(message);
        let Some(class) = self
            .classifier
            .classify(&normalized.text, normalized.has_card_markers)
        else {
            state.processed.insert(message.message_id);
            return ProcessOutcome::Ignored(IgnoreReason::Unclassifiable);
        };

        match class.phase {
            Phase::Placement => {
                let Some(amount) = self.evaluator.stake(class.game, &normalized.text) else {
                    debug!(
                        subject = subject_id,
                        game = %class.game,
                        message_id = message.message_id,
                        "Placement without a readable stake"
                    );
                    return ProcessOutcome::Ignored(IgnoreReason::MalformedAmount);
                };

                let bet = PendingBet {
                    game: class.game,
                    amount,
                    placed_at: now,
                    source: message.message_id,
                };
                let replaced = state
                    .pending
                    .insert(class.game, bet)
                    .is_some_and(|prior| prior.source != message.message_id);
                if replaced {
                    debug!(subject = subject_id, game = %class.game, "Replacing abandoned pending bet");
                }
                debug!(subject = subject_id, game = %class.game, amount, "Bet placed");

                ProcessOutcome::BetPlaced {
                    game: class.game,
                    amount,
                    replaced,
                }
            }
            Phase::Resolution => {
                let Some(bet) = state.take_pending(class.game, now, self.settings.stale_after) else {
                    debug!(
                        subject = subject_id,
                        game = %class.game,
                        message_id = message.message_id,
                        "Resolution without a pending bet"
                    );
                    state.processed.insert(message.message_id);
                    return ProcessOutcome::Ignored(IgnoreReason::UnmatchedResolution);
                };

                let outcome = self.evaluator.evaluate(class.game, &normalized.text, &bet);
                state.session.apply(&outcome);
                mark_resolved(&mut state.processed, message.message_id, bet.source);

                info!(
                    subject = subject_id,
                    game = %class.game,
                    stake = bet.amount,
                    gain = outcome.gain,
                    loss = outcome.loss,
                    verdict = ?outcome.verdict,
                    "Bet resolved"
                );

                ProcessOutcome::Resolved {
                    game: class.game,
                    outcome,
                }
            }
        }
    }
}

fn mark_resolved(processed: &mut ProcessedMessages, resolution: MessageId, placement: MessageId) {
    processed.insert(resolution);
    processed.insert(placement);
}
