//! The block store contract.

use std::sync::Arc;

use async_trait::async_trait;
use folio_types::{Block, BlockDraft, BlockId, BlockPatch};

use crate::error::StoreResult;

/// Events broadcast when the store changes.
#[derive(Clone, Debug)]
pub enum BlockEvent {
    /// A block was inserted.
    Created { block: Block },
    /// A block's position or payload changed.
    Updated { block: Block },
}

/// Ordered collection of blocks keyed by identifier.
///
/// Implementations must return `list` sorted by ascending position with
/// ties in storage order, assign identifiers themselves, and stamp
/// `created_at`/`updated_at`.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// All blocks, ascending by position.
    ///
    /// Fails with `Unavailable` on transport or database error.
    async fn list(&self) -> StoreResult<Vec<Block>>;

    /// Validate and insert a block.
    ///
    /// Fails with `Validation` when the kind is not text/image or the
    /// position is missing.
    async fn create(&self, draft: BlockDraft) -> StoreResult<Block>;

    /// Apply a partial update.
    ///
    /// Fails with `NoOp` when the patch is empty and `NotFound` when `id`
    /// does not exist.
    async fn update(&self, id: BlockId, patch: BlockPatch) -> StoreResult<Block>;
}

#[async_trait]
impl<T: BlockStore + ?Sized> BlockStore for Arc<T> {
    async fn list(&self) -> StoreResult<Vec<Block>> {
        (**self).list().await
    }

    async fn create(&self, draft: BlockDraft) -> StoreResult<Block> {
        (**self).create(draft).await
    }

    async fn update(&self, id: BlockId, patch: BlockPatch) -> StoreResult<Block> {
        (**self).update(id, patch).await
    }
}
