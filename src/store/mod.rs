//! Persistence of finished sessions.
//!
//! The tracker hands each finished session to a [`SessionStore`]. Stores must
//! not block: the channel-backed store queues records for a writer task.

pub mod jsonl;

pub use jsonl::{run_store_writer, ChannelSessionStore, JsonlWriter};

use crate::common::error::StoreError;
use crate::common::messages::SessionSummary;

/// Receives finished-session summaries. The tracker never reads them back.
pub trait SessionStore: Send + Sync {
    fn persist(&self, summary: SessionSummary) -> Result<(), StoreError>;
}
