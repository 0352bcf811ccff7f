use crate::history::clock::Clock;
use crate::history::storage::Storage;
use crate::history::store::{HistoryError, VersionStore};
use crate::model::Node;

pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 1500;

/// Tick-driven autosave timer.
///
/// The host calls [`Autosaver::tick`] whenever convenient; a save is attempted
/// once at least `interval_ms` has passed since the previous attempt, and the
/// store skips the write when the tree is unchanged.
#[derive(Debug, Clone)]
pub struct Autosaver {
    interval_ms: u64,
    last: u64,
}

impl Autosaver {
    /// A timer whose first interval starts at `now_ms`.
    pub fn new(interval_ms: u64, now_ms: u64) -> Self {
        Self {
            interval_ms,
            last: now_ms,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last) >= self.interval_ms
    }

    /// Autosave `doc` if the interval elapsed. Returns whether a write happened.
    pub fn tick<S: Storage, C: Clock>(
        &mut self,
        now_ms: u64,
        doc: &Node,
        store: &mut VersionStore<S, C>,
    ) -> Result<bool, HistoryError> {
        if !self.is_due(now_ms) {
            return Ok(false);
        }
        self.last = now_ms;
        store.autosave(doc)
    }
}
