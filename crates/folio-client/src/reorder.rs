//! Drag-to-reorder gesture state.
//!
//! A gesture is three device-independent events: `drag_start`, any number
//! of `drag_over`, then `drag_end` (or `cancel`). The list is reordered live
//! as the pointer crosses other blocks; only `drag_end` produces something
//! to commit.

use folio_types::Block;
use tracing::trace;

/// In-progress drag gesture over the local block list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderController {
    dragged_index: Option<usize>,
}

impl ReorderController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the dragged block currently occupies, if a drag is active.
    pub fn dragged_index(&self) -> Option<usize> {
        self.dragged_index
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged_index.is_some()
    }

    /// Begin dragging the block at `index`.
    ///
    /// An index past the end of `blocks` is ignored.
    pub fn drag_start(&mut self, blocks: &[Block], index: usize) {
        if index < blocks.len() {
            self.dragged_index = Some(index);
        }
    }

    /// The pointer is over the block at `target`: move the dragged block
    /// there. Nothing happens without an active drag, over itself, or past
    /// the end of the list.
    pub fn drag_over(&mut self, blocks: &mut Vec<Block>, target: usize) {
        let Some(from) = self.dragged_index else {
            return;
        };
        if from == target || from >= blocks.len() || target >= blocks.len() {
            return;
        }
        let block = blocks.remove(from);
        blocks.insert(target, block);
        trace!(from, target, "drag moved block");
        self.dragged_index = Some(target);
    }

    /// Finish the gesture.
    ///
    /// Renumbers every block to its 0-based index and returns the list to
    /// commit. The gesture is over either way; `None` means no drag was
    /// active.
    pub fn drag_end(&mut self, blocks: &mut [Block]) -> Option<Vec<Block>> {
        self.dragged_index.take()?;
        for (index, block) in blocks.iter_mut().enumerate() {
            block.position = index as i64;
        }
        Some(blocks.to_vec())
    }

    /// Abandon the gesture without committing.
    ///
    /// The live reordering already applied to the list is the caller's to
    /// undo (reload or restore from history).
    pub fn cancel(&mut self) {
        self.dragged_index = None;
    }
}
