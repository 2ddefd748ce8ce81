//! In-memory block store.
//!
//! Ephemeral: everything is lost when the store is dropped. Useful for
//! offline editing and for exercising the client against a store that can be
//! told to fail.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use folio_types::{now_millis, sort_by_position, Block, BlockDraft, BlockId, BlockPatch};

use crate::error::{StoreError, StoreResult};
use crate::seed::sample_drafts;
use crate::store::BlockStore;

#[derive(Default)]
struct Inner {
    /// Insertion order; `list` sorts a copy stably by position.
    blocks: Vec<Block>,
    next_id: i64,
    failing: HashSet<BlockId>,
    unavailable: bool,
}

/// Block store held in process memory.
#[derive(Default)]
pub struct MemoryBlockStore {
    inner: RwLock<Inner>,
    updates: AtomicUsize,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the sample document.
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        let now = now_millis();
        {
            let mut inner = store.inner.write();
            for draft in sample_drafts() {
                if let Ok(new) = draft.validate() {
                    inner.next_id += 1;
                    let id = BlockId::new(inner.next_id);
                    inner.blocks.push(new.into_block(id, now));
                }
            }
        }
        store
    }

    /// Store holding exactly `blocks`. IDs are kept; new IDs continue after
    /// the largest one.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        let next_id = blocks.iter().map(|b| b.id.get()).max().unwrap_or(0);
        Self {
            inner: RwLock::new(Inner {
                blocks,
                next_id,
                ..Default::default()
            }),
            updates: AtomicUsize::new(0),
        }
    }

    /// Make every update of `id` fail with `Unavailable`.
    pub fn fail_updates_for(&self, id: BlockId) {
        self.inner.write().failing.insert(id);
    }

    /// Undo [`fail_updates_for`](Self::fail_updates_for) and
    /// [`set_unavailable`](Self::set_unavailable).
    pub fn clear_failures(&self) {
        let mut inner = self.inner.write();
        inner.failing.clear();
        inner.unavailable = false;
    }

    /// Make every call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().unavailable = unavailable;
    }

    /// Number of `update` calls received, successful or not.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Current contents in list order, bypassing failure injection.
    pub fn snapshot(&self) -> Vec<Block> {
        let mut blocks = self.inner.read().blocks.clone();
        sort_by_position(&mut blocks);
        blocks
    }

    fn check_available(inner: &Inner) -> StoreResult<()> {
        if inner.unavailable {
            Err(StoreError::Unavailable("store is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn list(&self) -> StoreResult<Vec<Block>> {
        Self::check_available(&self.inner.read())?;
        Ok(self.snapshot())
    }

    async fn create(&self, draft: BlockDraft) -> StoreResult<Block> {
        let mut inner = self.inner.write();
        Self::check_available(&inner)?;
        let new = draft.validate()?;
        inner.next_id += 1;
        let block = new.into_block(BlockId::new(inner.next_id), now_millis());
        inner.blocks.push(block.clone());
        Ok(block)
    }

    async fn update(&self, id: BlockId, patch: BlockPatch) -> StoreResult<Block> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write();
        Self::check_available(&inner)?;
        if patch.is_empty() {
            return Err(StoreError::NoOp);
        }
        if inner.failing.contains(&id) {
            return Err(StoreError::Unavailable(format!("injected failure for {id}")));
        }
        let block = inner
            .blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut updated = block.clone();
        updated.apply_patch(&patch)?;
        updated.touch(now_millis());
        *block = updated.clone();
        Ok(updated)
    }
}
