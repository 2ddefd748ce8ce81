//! Pushing a desired block list to the store.
//!
//! A commit sends one update per block, all at once, and waits for every
//! response. If all of them land, the store's answer becomes the new local
//! state and is recorded in history. If any fails, the local mutation is
//! thrown away: the list is re-fetched and history restarts from it.
//!
//! ```text
//! desired ──► update × N (concurrent) ──► all Ok ──► Committed(returned)
//!                                    │                 └─ save_state
//!                                    └─► any Err ──► list() ──► Reverted
//!                                                               └─ reset
//! ```

use std::sync::Arc;

use folio_store::{BlockStore, StoreError, StoreResult};
use folio_types::{Block, BlockPatch};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::history::HistoryManager;

/// How a commit ended. Either way the carried list is authoritative and
/// replaces the local one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every update landed; blocks as the store returned them, in the
    /// order they were committed.
    Committed(Vec<Block>),
    /// At least one update failed; blocks freshly listed from the store.
    Reverted { blocks: Vec<Block>, reason: StoreError },
}

impl CommitOutcome {
    /// The state to adopt.
    pub fn blocks(&self) -> &[Block] {
        match self {
            CommitOutcome::Committed(blocks) => blocks,
            CommitOutcome::Reverted { blocks, .. } => blocks,
        }
    }

    pub fn into_blocks(self) -> Vec<Block> {
        match self {
            CommitOutcome::Committed(blocks) => blocks,
            CommitOutcome::Reverted { blocks, .. } => blocks,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed(_))
    }
}

/// Pushes block lists to a [`BlockStore`].
#[derive(Clone)]
pub struct SyncCoordinator {
    store: Arc<dyn BlockStore>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn BlockStore> {
        &self.store
    }

    /// Push `desired` to the store.
    ///
    /// Each block is sent with its position and full payload, so the same
    /// call serves reorders, edits and history restorations. On success the
    /// result is saved to `history` (a no-op while restoring). On failure
    /// `history` is reset to the re-fetched list.
    ///
    /// Returns `Err` only when the re-fetch after a failed update fails too;
    /// the caller then has no authoritative state to adopt.
    #[instrument(name = "sync.commit", skip_all, fields(blocks = desired.len(), restoring = history.is_restoring()))]
    pub async fn commit(
        &self,
        history: &mut HistoryManager,
        desired: Vec<Block>,
    ) -> StoreResult<CommitOutcome> {
        let updates = desired.iter().map(|block| {
            let store = Arc::clone(&self.store);
            let patch = BlockPatch::from_block(block);
            let id = block.id;
            async move { store.update(id, patch).await }
        });
        let results = join_all(updates).await;

        let mut committed = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(block) => committed.push(block),
                Err(e) => {
                    warn!(error = %e, "block update failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            None => {
                debug!("all updates landed");
                history.save_state(&committed);
                Ok(CommitOutcome::Committed(committed))
            }
            Some(reason) => {
                let blocks = self.store.list().await?;
                info!(
                    blocks = blocks.len(),
                    reason = %reason,
                    "commit failed, reverted to store state"
                );
                history.reset(&blocks);
                Ok(CommitOutcome::Reverted { blocks, reason })
            }
        }
    }
}
