//! Shared block types for Folio.
//!
//! This crate is the leaf every other Folio crate builds on: the block record
//! as it travels between SQLite, the REST API, and the editor client. It has
//! **no internal folio dependencies**.
//!
//! # Key Types
//!
//! |-----------------|-----------------------------------------------------|
//! | Type            | Purpose                                             |
//! |-----------------|-----------------------------------------------------|
//! | [`BlockId`]     | Store-assigned integer identity                     |
//! | [`Block`]       | Full block record (payload + position + timestamps) |
//! | [`BlockContent`]| Kind-specific payload (text or image)               |
//! | [`BlockDraft`]  | Unvalidated create request                          |
//! | [`NewBlock`]    | Validated create request                            |
//! | [`BlockPatch`]  | Partial update                                      |
//! | [`BlockError`]  | Why a draft or patch was rejected                   |
//! |-----------------|-----------------------------------------------------|

pub mod block;
pub mod ids;

pub use block::{
    Block, BlockContent, BlockDraft, BlockError, BlockKind, BlockPatch, NewBlock, TextStyle,
    sort_by_position,
};
pub use ids::BlockId;

/// Default rendering width for images stored without dimensions.
pub const DEFAULT_IMAGE_WIDTH: u32 = 800;

/// Default rendering height for images stored without dimensions.
pub const DEFAULT_IMAGE_HEIGHT: u32 = 400;

/// Widest an image is ever displayed; wider images scale down proportionally.
pub const MAX_DISPLAY_WIDTH: u32 = 900;

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
