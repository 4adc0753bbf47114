//! Event classification and correlation engine.
//!
//! ## Module Structure
//!
//! - `amount`: digit-run extraction from free text
//! - `normalize`: folds message text and embeds into one classifiable blob
//! - `classify`: game and phase detection
//! - `outcome`: stake extraction and gain/loss evaluation
//! - `session`: per-subject totals, pending bets, processed ids
//! - `engine`: the `SessionManager` state machine and lifecycle

pub mod amount;
pub mod classify;
pub mod engine;
pub mod normalize;
pub mod outcome;
pub mod session;

pub use engine::{EngineSettings, ProcessOutcome, SessionManager};
