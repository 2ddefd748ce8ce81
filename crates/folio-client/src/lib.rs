//! Folio editor client library
//!
//! Everything an editor front end needs besides rendering:
//!
//! - [`HistoryManager`]: bounded whole-list snapshots with undo/redo.
//! - [`ReorderController`]: the drag gesture and live reordering.
//! - [`SyncCoordinator`]: pushes a desired list to the store, reverting to
//!   the store's state if any update fails.
//! - [`ShortcutDispatcher`]: undo/redo key chords.
//! - [`EditorSession`]: the above wired together over one block list.
//! - [`HttpBlockStore`]: the block store contract over the REST API.

pub mod constants;
pub mod history;
pub mod http;
pub mod keys;
pub mod reorder;
pub mod session;
pub mod sync;

pub use history::{HistoryManager, HistorySnapshot};
pub use http::{HttpBlockStore, HttpError};
pub use keys::{
    InputContext, KeyEvent, KeyOutcome, Modifiers, Platform, ShortcutAction, ShortcutDispatcher,
};
pub use reorder::ReorderController;
pub use session::{EditorSession, OFFLINE_NOTICE, REVERT_NOTICE};
pub use sync::{CommitOutcome, SyncCoordinator};
