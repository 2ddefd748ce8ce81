//! Linear undo/redo history over whole-list snapshots.
//!
//! Every committed mutation records a deep copy of the block list. Undo and
//! redo move a cursor through the log and hand back the snapshot to restore.
//!
//! # Re-entrancy
//!
//! Pushing a restored snapshot back to the store is itself a commit. That
//! commit must not be recorded, so [`HistoryManager::undo`] and
//! [`HistoryManager::redo`] raise a `restoring` flag before returning, and
//! [`HistoryManager::save_state`] drops everything while it is up. Whoever
//! drives the restoration commit calls [`HistoryManager::finish_restore`]
//! once it settles, whatever the outcome.
//!
//! ```text
//! reset(L0)        [L0]            cursor=0
//! save_state(L1)   [L0, L1]        cursor=1
//! save_state(L2)   [L0, L1, L2]    cursor=2
//! undo() -> L1     [L0, L1, L2]    cursor=1  restoring
//! finish_restore()                           idle
//! save_state(L3)   [L0, L1, L3]    cursor=2  (L2 dropped)
//! ```

use folio_types::{now_millis, Block};
use tracing::trace;

use crate::constants::MAX_HISTORY;

/// Immutable deep copy of the block list at one point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub blocks: Vec<Block>,
    /// Unix millis when the snapshot was taken.
    pub created_at: u64,
}

impl HistorySnapshot {
    fn of(blocks: &[Block]) -> Self {
        Self {
            blocks: blocks.to_vec(),
            created_at: now_millis(),
        }
    }
}

/// Bounded snapshot log with a cursor.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<HistorySnapshot>,
    cursor: usize,
    restoring: bool,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    /// Empty history holding up to [`MAX_HISTORY`] snapshots.
    ///
    /// The log stays empty until the first [`reset`](Self::reset).
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// History with a custom bound (at least one entry).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            restoring: false,
            capacity: capacity.max(1),
        }
    }

    /// Replace the log with a single snapshot of `blocks`.
    ///
    /// Called whenever the list is freshly loaded from the store.
    pub fn reset(&mut self, blocks: &[Block]) {
        self.entries.clear();
        self.entries.push(HistorySnapshot::of(blocks));
        self.cursor = 0;
        self.restoring = false;
    }

    /// Record a committed state.
    ///
    /// Silently ignored while a restoration is in flight. Otherwise any redo
    /// entries past the cursor are discarded, the snapshot is appended and
    /// the oldest entries are evicted to stay within capacity.
    pub fn save_state(&mut self, blocks: &[Block]) {
        if self.restoring {
            trace!("save_state ignored during restoration");
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(HistorySnapshot::of(blocks));
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one snapshot.
    ///
    /// Returns `None` (and changes nothing) when already at the oldest entry.
    /// On success the restoring flag is raised.
    pub fn undo(&mut self) -> Option<Vec<Block>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.restoring = true;
        Some(self.entries[self.cursor].blocks.clone())
    }

    /// Step forward one snapshot. Mirror of [`undo`](Self::undo).
    pub fn redo(&mut self) -> Option<Vec<Block>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.restoring = true;
        Some(self.entries[self.cursor].blocks.clone())
    }

    /// Lower the restoring flag once the restoration commit has settled.
    pub fn finish_restore(&mut self) {
        self.restoring = false;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Snapshots in the log. Zero only before the first
    /// [`reset`](Self::reset); from then on the log always holds at least
    /// the loaded state.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True only for a history that has never been [`reset`](Self::reset).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.entries.get(self.cursor)
    }
}
