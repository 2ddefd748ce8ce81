//! One editing session over a block list.
//!
//! [`EditorSession`] owns the local list and wires the pieces together:
//! drag events go to the [`ReorderController`], commits go through the
//! [`SyncCoordinator`], and every committed mutation lands in the
//! [`HistoryManager`]. All mutating methods take `&mut self`, so commits
//! never overlap.

use std::sync::Arc;

use folio_store::{BlockStore, StoreError, StoreResult};
use folio_types::{Block, BlockDraft, BlockId, BlockPatch};
use tracing::{info, instrument, warn};

use crate::history::HistoryManager;
use crate::keys::{InputContext, KeyEvent, KeyOutcome, ShortcutAction, ShortcutDispatcher};
use crate::reorder::ReorderController;
use crate::sync::{CommitOutcome, SyncCoordinator};

/// Shown when a commit was rolled back to the store's state.
pub const REVERT_NOTICE: &str = "Failed to save changes. Reverted to the saved document.";

/// Shown when the store cannot be reached at all.
pub const OFFLINE_NOTICE: &str = "Cannot reach the block store.";

/// Editor state for one document.
pub struct EditorSession {
    blocks: Vec<Block>,
    history: HistoryManager,
    reorder: ReorderController,
    sync: SyncCoordinator,
    keys: ShortcutDispatcher,
    /// List as it was when the current drag began; restored on cancel.
    drag_origin: Option<Vec<Block>>,
    notice: Option<String>,
}

impl EditorSession {
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        Self::with_dispatcher(store, ShortcutDispatcher::default())
    }

    pub fn with_dispatcher(store: Arc<dyn BlockStore>, keys: ShortcutDispatcher) -> Self {
        Self {
            blocks: Vec::new(),
            history: HistoryManager::new(),
            reorder: ReorderController::new(),
            sync: SyncCoordinator::new(store),
            keys,
            drag_origin: None,
            notice: None,
        }
    }

    /// Blocks in display order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_dragging(&self) -> bool {
        self.reorder.is_dragging()
    }

    pub fn dragged_index(&self) -> Option<usize> {
        self.reorder.dragged_index()
    }

    /// Last user-visible failure, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn store(&self) -> &Arc<dyn BlockStore> {
        self.sync.store()
    }

    /// Fetch the list from the store and restart history from it.
    #[instrument(name = "sync.load", skip(self))]
    pub async fn load(&mut self) -> StoreResult<()> {
        let result = self.store().list().await;
        match result {
            Ok(blocks) => {
                info!(blocks = blocks.len(), "loaded document");
                self.history.reset(&blocks);
                self.blocks = blocks;
                self.reorder.cancel();
                self.drag_origin = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load blocks");
                self.notice = Some(OFFLINE_NOTICE.into());
                Err(e)
            }
        }
    }

    /// Append a new block at the end of the list.
    ///
    /// The draft's position is overwritten with one past the highest
    /// position in the list (0 when empty), so the store sorts it last even
    /// when positions have gaps. On any error the local list is left as it
    /// was.
    #[instrument(name = "sync.create", skip(self, draft))]
    pub async fn create_block(&mut self, mut draft: BlockDraft) -> StoreResult<&Block> {
        let next = self.blocks.iter().map(|b| b.position).max().map_or(0, |p| p + 1);
        draft.position = Some(next);
        let result = self.store().create(draft).await;
        match result {
            Ok(block) => {
                self.blocks.push(block);
                self.history.save_state(&self.blocks);
                Ok(&self.blocks[self.blocks.len() - 1])
            }
            Err(e) => {
                warn!(error = %e, "create rejected");
                self.notice = Some(format!("Could not add block: {e}"));
                Err(e)
            }
        }
    }

    /// Update one block's payload.
    ///
    /// Rejected input leaves everything as is. An unreachable store or a
    /// vanished block re-syncs the whole list.
    #[instrument(name = "sync.edit", skip(self, patch), fields(id = %id))]
    pub async fn edit_block(&mut self, id: BlockId, patch: BlockPatch) -> StoreResult<&Block> {
        let result = self.store().update(id, patch).await;
        match result {
            Ok(updated) => {
                let index = match self.blocks.iter().position(|b| b.id == id) {
                    Some(index) => {
                        self.blocks[index] = updated;
                        index
                    }
                    None => {
                        self.blocks.push(updated);
                        self.blocks.len() - 1
                    }
                };
                self.history.save_state(&self.blocks);
                Ok(&self.blocks[index])
            }
            Err(e @ (StoreError::Validation(_) | StoreError::NoOp)) => {
                warn!(error = %e, "edit rejected");
                self.notice = Some(format!("Could not save edit: {e}"));
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "edit failed, re-syncing");
                // A failed reload already set the offline notice.
                if self.load().await.is_ok() {
                    self.notice = Some(REVERT_NOTICE.into());
                }
                Err(e)
            }
        }
    }

    pub fn drag_start(&mut self, index: usize) {
        self.reorder.drag_start(&self.blocks, index);
        if self.reorder.is_dragging() {
            self.drag_origin = Some(self.blocks.clone());
        }
    }

    pub fn drag_over(&mut self, target: usize) {
        self.reorder.drag_over(&mut self.blocks, target);
    }

    /// Drop the dragged block and commit the new order.
    ///
    /// `Ok(None)` when no drag was active.
    pub async fn drag_end(&mut self) -> StoreResult<Option<CommitOutcome>> {
        self.drag_origin = None;
        let Some(desired) = self.reorder.drag_end(&mut self.blocks) else {
            return Ok(None);
        };
        let result = self.sync.commit(&mut self.history, desired).await;
        self.adopt(result).map(Some)
    }

    /// Abandon the drag and put the list back the way it was.
    pub fn cancel_drag(&mut self) {
        self.reorder.cancel();
        if let Some(origin) = self.drag_origin.take() {
            self.blocks = origin;
        }
    }

    /// Restore the previous snapshot. `Ok(None)` if there is nothing to undo.
    pub async fn undo(&mut self) -> StoreResult<Option<CommitOutcome>> {
        let Some(snapshot) = self.history.undo() else {
            return Ok(None);
        };
        self.restore(snapshot).await.map(Some)
    }

    /// Re-apply the next snapshot. `Ok(None)` if there is nothing to redo.
    pub async fn redo(&mut self) -> StoreResult<Option<CommitOutcome>> {
        let Some(snapshot) = self.history.redo() else {
            return Ok(None);
        };
        self.restore(snapshot).await.map(Some)
    }

    async fn restore(&mut self, snapshot: Vec<Block>) -> StoreResult<CommitOutcome> {
        self.blocks = snapshot.clone();
        let result = self.sync.commit(&mut self.history, snapshot).await;
        self.history.finish_restore();
        self.adopt(result)
    }

    /// Run a key event through the shortcut dispatcher.
    pub async fn handle_key(&mut self, event: KeyEvent, context: InputContext) -> KeyOutcome {
        let outcome = self.keys.dispatch(event, context);
        // Failures are already reported through the notice slot.
        match outcome.action {
            Some(ShortcutAction::Undo) => {
                let _ = self.undo().await;
            }
            Some(ShortcutAction::Redo) => {
                let _ = self.redo().await;
            }
            None => {}
        }
        outcome
    }

    fn adopt(&mut self, result: StoreResult<CommitOutcome>) -> StoreResult<CommitOutcome> {
        match result {
            Ok(outcome) => {
                if !outcome.is_committed() {
                    self.notice = Some(REVERT_NOTICE.into());
                }
                self.blocks = outcome.blocks().to_vec();
                Ok(outcome)
            }
            Err(e) => {
                self.notice = Some(OFFLINE_NOTICE.into());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{Modifiers, Platform};
    use folio_store::MemoryBlockStore;
    use folio_types::{BlockContent, TextStyle};

    async fn session() -> (Arc<MemoryBlockStore>, EditorSession) {
        let store = Arc::new(MemoryBlockStore::with_sample_data());
        let mut session = EditorSession::with_dispatcher(
            store.clone(),
            ShortcutDispatcher::new(Platform::Other),
        );
        session.load().await.unwrap();
        (store, session)
    }

    fn texts(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| b.text().unwrap_or_default().to_string())
            .collect()
    }

    fn ids(blocks: &[Block]) -> Vec<BlockId> {
        blocks.iter().map(|b| b.id).collect()
    }

    #[tokio::test]
    async fn test_load_resets_history() {
        let (_store, session) = session().await;
        assert_eq!(session.blocks().len(), 5);
        assert!(!session.can_undo());
        assert!(!session.can_redo());
    }

    #[tokio::test]
    async fn test_create_appends_at_end() {
        let (store, mut session) = session().await;
        let block = session
            .create_block(BlockDraft::text(TextStyle::H3, "new", 0))
            .await
            .unwrap()
            .clone();
        assert_eq!(block.position, 5);
        assert_eq!(session.blocks().last().unwrap().id, block.id);
        assert!(session.can_undo());
        assert_eq!(store.snapshot().len(), 6);
    }

    #[tokio::test]
    async fn test_create_after_gapped_positions_sorts_last() {
        let blocks = vec![
            Block::new(BlockId::new(1), BlockContent::text(TextStyle::Paragraph, "a"), 0, 1),
            Block::new(BlockId::new(2), BlockContent::text(TextStyle::Paragraph, "b"), 10, 1),
        ];
        let store = Arc::new(MemoryBlockStore::with_blocks(blocks));
        let mut session = EditorSession::new(store.clone());
        session.load().await.unwrap();

        let block = session
            .create_block(BlockDraft::text(TextStyle::Paragraph, "new", 0))
            .await
            .unwrap()
            .clone();
        assert_eq!(block.position, 11);

        assert_eq!(texts(session.blocks()), vec!["a", "b", "new"]);
        assert_eq!(texts(&store.snapshot()), texts(session.blocks()));
    }

    #[tokio::test]
    async fn test_create_into_empty_list_starts_at_zero() {
        let store = Arc::new(MemoryBlockStore::new());
        let mut session = EditorSession::new(store);
        session.load().await.unwrap();
        let block = session
            .create_block(BlockDraft::text(TextStyle::H1, "first", 42))
            .await
            .unwrap();
        assert_eq!(block.position, 0);
    }

    #[tokio::test]
    async fn test_undo_restores_unset_text_content() {
        let (store, mut session) = session().await;
        let id = session
            .create_block(BlockDraft::text(TextStyle::Paragraph, "", 0))
            .await
            .unwrap()
            .id;
        assert_eq!(session.blocks().last().unwrap().text(), None);

        session
            .edit_block(id, BlockPatch::content("hello"))
            .await
            .unwrap();
        let outcome = session.undo().await.unwrap().unwrap();
        assert!(outcome.is_committed());

        let stored = store.snapshot().into_iter().find(|b| b.id == id).unwrap();
        assert_eq!(session.blocks().last().unwrap().text(), None);
        assert_eq!(stored.text(), None);
    }

    #[tokio::test]
    async fn test_undo_restores_unset_image_dimensions() {
        let (store, mut session) = session().await;
        let id = session
            .create_block(BlockDraft::image("/uploads/cat.png", None, None, 0))
            .await
            .unwrap()
            .id;
        let r#unsized = session.blocks().last().unwrap().content.clone();

        let patch = BlockPatch {
            width: Some(Some(300)),
            height: Some(Some(120)),
            ..Default::default()
        };
        session.edit_block(id, patch).await.unwrap();
        assert_eq!(session.blocks().last().unwrap().display_size(), Some((300, 120)));

        session.undo().await.unwrap().unwrap();
        let stored = store.snapshot().into_iter().find(|b| b.id == id).unwrap();
        assert_eq!(session.blocks().last().unwrap().content, r#unsized);
        assert_eq!(stored.content, r#unsized);

        session.redo().await.unwrap().unwrap();
        let stored = store.snapshot().into_iter().find(|b| b.id == id).unwrap();
        assert_eq!(stored.display_size(), Some((300, 120)));
    }

    #[tokio::test]
    async fn test_invalid_create_leaves_list() {
        let (_store, mut session) = session().await;
        let before = session.blocks().to_vec();
        let draft = BlockDraft {
            kind: Some("video".into()),
            ..Default::default()
        };
        let err = session.create_block(draft).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(session.blocks(), before.as_slice());
        assert!(!session.can_undo());
        assert!(session.notice().is_some());
    }

    #[tokio::test]
    async fn test_edit_then_undo_redo() {
        let (store, mut session) = session().await;
        let id = session.blocks()[0].id;

        session
            .edit_block(id, BlockPatch::content("Edited"))
            .await
            .unwrap();
        assert_eq!(session.blocks()[0].text(), Some("Edited"));

        let outcome = session.undo().await.unwrap().unwrap();
        assert!(outcome.is_committed());
        assert_eq!(session.blocks()[0].text(), Some("Welcome to Folio"));
        assert_eq!(store.snapshot()[0].text(), Some("Welcome to Folio"));
        assert!(!session.history().is_restoring());
        assert!(session.can_redo());

        session.redo().await.unwrap().unwrap();
        assert_eq!(store.snapshot()[0].text(), Some("Edited"));
        assert!(!session.can_redo());
    }

    #[tokio::test]
    async fn test_drag_commit_and_undo() {
        let (store, mut session) = session().await;
        let original = ids(session.blocks());

        session.drag_start(0);
        session.drag_over(1);
        session.drag_over(2);
        let outcome = session.drag_end().await.unwrap().unwrap();
        assert!(outcome.is_committed());

        let moved = ids(session.blocks());
        assert_eq!(moved[2], original[0]);
        assert_eq!(ids(&store.snapshot()), moved);
        let positions: Vec<i64> = session.blocks().iter().map(|b| b.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);

        session.undo().await.unwrap().unwrap();
        assert_eq!(ids(session.blocks()), original);
        assert_eq!(ids(&store.snapshot()), original);
    }

    #[tokio::test]
    async fn test_failed_drag_reverts_to_store() {
        let (store, mut session) = session().await;
        let original = ids(session.blocks());
        store.fail_updates_for(original[1]);

        session.drag_start(0);
        session.drag_over(2);
        let outcome = session.drag_end().await.unwrap().unwrap();
        assert!(!outcome.is_committed());
        assert_eq!(session.blocks(), store.snapshot().as_slice());
        assert_eq!(session.notice(), Some(REVERT_NOTICE));
        assert!(!session.can_undo());
        assert!(!session.is_dragging());
    }

    #[tokio::test]
    async fn test_cancel_drag_restores_order() {
        let (store, mut session) = session().await;
        let original = ids(session.blocks());
        session.drag_start(4);
        session.drag_over(0);
        assert_ne!(ids(session.blocks()), original);

        session.cancel_drag();
        assert_eq!(ids(session.blocks()), original);
        assert!(session.drag_end().await.unwrap().is_none());
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_missing_block_resyncs() {
        let (_store, mut session) = session().await;
        let err = session
            .edit_block(BlockId::new(404), BlockPatch::content("x"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(BlockId::new(404)));
        assert_eq!(session.notice(), Some(REVERT_NOTICE));
        assert_eq!(session.blocks().len(), 5);
    }

    #[tokio::test]
    async fn test_key_chords_drive_history() {
        let (_store, mut session) = session().await;
        let id = session.blocks()[1].id;
        session
            .edit_block(id, BlockPatch::style(TextStyle::H2))
            .await
            .unwrap();

        let outcome = session
            .handle_key(KeyEvent::new('z', Modifiers::CTRL), InputContext::Document)
            .await;
        assert_eq!(outcome.action, Some(ShortcutAction::Undo));
        assert!(outcome.prevent_default);
        assert!(session.can_redo());

        let outcome = session
            .handle_key(KeyEvent::new('z', Modifiers::CTRL), InputContext::TextInput)
            .await;
        assert_eq!(outcome.action, None);
        assert!(session.can_redo(), "text field keeps its own undo");

        session
            .handle_key(KeyEvent::new('z', Modifiers::CTRL_SHIFT), InputContext::Document)
            .await;
        assert!(!session.can_redo());
    }

    #[tokio::test]
    async fn test_offline_load_sets_notice() {
        let store = Arc::new(MemoryBlockStore::new());
        store.set_unavailable(true);
        let mut session = EditorSession::new(store.clone());
        assert!(session.load().await.is_err());
        assert_eq!(session.take_notice().as_deref(), Some(OFFLINE_NOTICE));
        assert!(session.notice().is_none());
    }
}
