//! Block record, create drafts, and partial updates.
//!
//! ## Wire shape
//!
//! A block is a flat JSON record. The `type` tag selects which payload fields
//! exist; fields belonging to the other kind are *absent*, while unset
//! optional fields of the block's own kind are `null`:
//!
//! ```json
//! {"id":3,"type":"image","imageUrl":"/uploads/a.png","width":null,"height":null,
//!  "position":2,"createdAt":1718000000000,"updatedAt":1718000000000}
//! ```
//!
//! `kind` is immutable after creation: a [`BlockPatch`] can change payload
//! fields of the block's own kind and its position, nothing else.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use strum::EnumString;
use thiserror::Error;

use crate::ids::BlockId;
use crate::{DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH, MAX_DISPLAY_WIDTH};

/// What a block *is*. Fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum BlockKind {
    /// Styled text (heading or paragraph).
    Text,
    /// Image by URL.
    Image,
}

impl BlockKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Image => "image",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typographic style of a text block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum TextStyle {
    H1,
    H2,
    H3,
    #[default]
    #[serde(rename = "p", alias = "paragraph")]
    #[strum(serialize = "p", serialize = "paragraph")]
    Paragraph,
}

impl TextStyle {
    /// Parse from string (case-insensitive). Accepts `p` and `paragraph`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to the stored/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStyle::H1 => "h1",
            TextStyle::H2 => "h2",
            TextStyle::H3 => "h3",
            TextStyle::Paragraph => "p",
        }
    }
}

impl std::fmt::Display for TextStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockContent {
    Text {
        content: Option<String>,
        #[serde(default)]
        style: TextStyle,
    },
    Image {
        #[serde(rename = "imageUrl")]
        url: String,
        width: Option<u32>,
        height: Option<u32>,
    },
}

impl BlockContent {
    /// Text payload with the given style.
    pub fn text(style: TextStyle, content: impl Into<String>) -> Self {
        BlockContent::Text {
            content: Some(content.into()),
            style,
        }
    }

    /// Image payload without explicit dimensions.
    pub fn image(url: impl Into<String>) -> Self {
        BlockContent::Image {
            url: url.into(),
            width: None,
            height: None,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            BlockContent::Text { .. } => BlockKind::Text,
            BlockContent::Image { .. } => BlockKind::Image,
        }
    }
}

/// A block as stored and served.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub content: BlockContent,
    /// Sort key. Not unique; ties keep storage order.
    pub position: i64,
    /// Unix millis, server-assigned.
    pub created_at: u64,
    /// Unix millis, server-assigned, never below `created_at`.
    pub updated_at: u64,
}

impl Block {
    /// Create a block stamped with `now` for both timestamps.
    pub fn new(id: BlockId, content: BlockContent, position: i64, now: u64) -> Self {
        Self {
            id,
            content,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.content.kind()
    }

    /// Text content, if this is a text block with content set.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            BlockContent::Text { content, .. } => content.as_deref(),
            BlockContent::Image { .. } => None,
        }
    }

    /// Advance `updated_at`, keeping it monotonic and `>= created_at`.
    pub fn touch(&mut self, now: u64) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }

    /// Apply a partial update in place.
    ///
    /// Validation happens before any field is written, so a rejected patch
    /// leaves the block untouched. Timestamps are the store's business.
    pub fn apply_patch(&mut self, patch: &BlockPatch) -> Result<(), BlockError> {
        if patch.is_empty() {
            return Err(BlockError::EmptyPatch);
        }
        let kind = self.kind();
        match kind {
            BlockKind::Text => {
                reject_field(patch.image_url.is_some(), "imageUrl", kind)?;
                reject_field(patch.width.is_some(), "width", kind)?;
                reject_field(patch.height.is_some(), "height", kind)?;
            }
            BlockKind::Image => {
                reject_field(patch.content.is_some(), "content", kind)?;
                reject_field(patch.style.is_some(), "style", kind)?;
                if patch.image_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                    return Err(BlockError::MissingImageUrl);
                }
                require_positive(patch.width.flatten(), "width")?;
                require_positive(patch.height.flatten(), "height")?;
            }
        }

        if let Some(position) = patch.position {
            self.position = position;
        }
        match &mut self.content {
            BlockContent::Text { content, style } => {
                if let Some(c) = &patch.content {
                    *content = c.clone();
                }
                if let Some(s) = patch.style {
                    *style = s;
                }
            }
            BlockContent::Image { url, width, height } => {
                if let Some(u) = &patch.image_url {
                    *url = u.clone();
                }
                if let Some(w) = patch.width {
                    *width = w;
                }
                if let Some(h) = patch.height {
                    *height = h;
                }
            }
        }
        Ok(())
    }

    /// Rendered size of an image block: stored dimensions (or the 800×400
    /// default), scaled proportionally to fit [`MAX_DISPLAY_WIDTH`].
    ///
    /// Returns `None` for text blocks.
    pub fn display_size(&self) -> Option<(u32, u32)> {
        let BlockContent::Image { width, height, .. } = &self.content else {
            return None;
        };
        let w = width.unwrap_or(DEFAULT_IMAGE_WIDTH);
        let h = height.unwrap_or(DEFAULT_IMAGE_HEIGHT);
        if w <= MAX_DISPLAY_WIDTH {
            return Some((w, h));
        }
        let w64 = u64::from(w);
        let scaled = (u64::from(h) * u64::from(MAX_DISPLAY_WIDTH) + w64 / 2) / w64;
        Some((MAX_DISPLAY_WIDTH, scaled as u32))
    }
}

/// Sort blocks by ascending position. Stable, so equal positions keep the
/// order they arrived in (storage order from the store).
pub fn sort_by_position(blocks: &mut [Block]) {
    blocks.sort_by_key(|b| b.position);
}

fn reject_field(present: bool, field: &'static str, kind: BlockKind) -> Result<(), BlockError> {
    if present {
        Err(BlockError::NotApplicable { field, kind })
    } else {
        Ok(())
    }
}

fn require_positive(value: Option<u32>, field: &'static str) -> Result<(), BlockError> {
    match value {
        Some(0) => Err(BlockError::NonPositive { field }),
        _ => Ok(()),
    }
}

/// Why a draft or patch was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// No `type` given.
    #[error("block type is required")]
    MissingKind,

    /// `type` is neither `text` nor `image`.
    #[error("invalid block type: {0}")]
    InvalidKind(String),

    /// No `position` given on create.
    #[error("position is required")]
    MissingPosition,

    /// Image block without a URL.
    #[error("image url is required")]
    MissingImageUrl,

    /// Zero width or height.
    #[error("{field} must be a positive integer")]
    NonPositive { field: &'static str },

    /// Field belongs to the other block kind.
    #[error("field `{field}` does not apply to {kind} blocks")]
    NotApplicable { field: &'static str, kind: BlockKind },

    /// Update with nothing to change.
    #[error("no fields to update")]
    EmptyPatch,
}

/// An unvalidated create request, as a client sends it.
///
/// Everything is optional so that a malformed request still parses and can
/// be rejected with a precise [`BlockError`] instead of a decode failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDraft {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl BlockDraft {
    /// Draft a text block.
    pub fn text(style: TextStyle, content: impl Into<String>, position: i64) -> Self {
        Self {
            kind: Some(BlockKind::Text.as_str().to_string()),
            content: Some(content.into()),
            style: Some(style),
            position: Some(position),
            ..Default::default()
        }
    }

    /// Draft an image block.
    pub fn image(
        url: impl Into<String>,
        width: Option<u32>,
        height: Option<u32>,
        position: i64,
    ) -> Self {
        Self {
            kind: Some(BlockKind::Image.as_str().to_string()),
            image_url: Some(url.into()),
            width,
            height,
            position: Some(position),
            ..Default::default()
        }
    }

    /// Check the draft and turn it into a [`NewBlock`].
    ///
    /// Empty text content is stored as unset.
    pub fn validate(&self) -> Result<NewBlock, BlockError> {
        let raw_kind = self.kind.as_deref().ok_or(BlockError::MissingKind)?;
        let kind = BlockKind::from_str(raw_kind)
            .ok_or_else(|| BlockError::InvalidKind(raw_kind.to_string()))?;
        let position = self.position.ok_or(BlockError::MissingPosition)?;

        let content = match kind {
            BlockKind::Text => {
                reject_field(self.image_url.is_some(), "imageUrl", kind)?;
                reject_field(self.width.is_some(), "width", kind)?;
                reject_field(self.height.is_some(), "height", kind)?;
                BlockContent::Text {
                    content: self.content.clone().filter(|c| !c.is_empty()),
                    style: self.style.unwrap_or_default(),
                }
            }
            BlockKind::Image => {
                reject_field(self.content.is_some(), "content", kind)?;
                reject_field(self.style.is_some(), "style", kind)?;
                let url = self
                    .image_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .ok_or(BlockError::MissingImageUrl)?;
                require_positive(self.width, "width")?;
                require_positive(self.height, "height")?;
                BlockContent::Image {
                    url: url.to_string(),
                    width: self.width,
                    height: self.height,
                }
            }
        };

        Ok(NewBlock { content, position })
    }
}

/// A validated create request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBlock {
    pub content: BlockContent,
    pub position: i64,
}

impl NewBlock {
    /// Materialize with a store-assigned ID and timestamp.
    pub fn into_block(self, id: BlockId, now: u64) -> Block {
        Block::new(id, self.content, self.position, now)
    }
}

/// A key that is present maps to `Some`, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update. `None` means "leave as is".
///
/// Fields a block may hold unset (`content`, `width`, `height`) are
/// tri-state: `None` leaves them, `Some(None)` clears them (`null` on the
/// wire), `Some(Some(v))` sets them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub width: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub height: Option<Option<u32>>,
}

impl BlockPatch {
    /// Patch that only moves a block.
    pub fn position(position: i64) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    /// Patch that replaces text content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(Some(content.into())),
            ..Default::default()
        }
    }

    /// Patch that changes text style.
    pub fn style(style: TextStyle) -> Self {
        Self {
            style: Some(style),
            ..Default::default()
        }
    }

    /// Patch carrying every mutable field of `block`, unset fields as
    /// explicit clears.
    ///
    /// Pushing this brings the stored row back to `block`'s position and
    /// payload, which is what restoring a history snapshot needs.
    pub fn from_block(block: &Block) -> Self {
        let mut patch = Self::position(block.position);
        match &block.content {
            BlockContent::Text { content, style } => {
                patch.content = Some(content.clone());
                patch.style = Some(*style);
            }
            BlockContent::Image { url, width, height } => {
                patch.image_url = Some(url.clone());
                patch.width = Some(*width);
                patch.height = Some(*height);
            }
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.content.is_none()
            && self.style.is_none()
            && self.image_url.is_none()
            && self.width.is_none()
            && self.height.is_none()
    }
}
