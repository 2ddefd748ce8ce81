//! Plain-text rendering of the block list.

use folio_types::{Block, BlockContent};

use crate::constants::SUMMARY_WIDTH;

/// Truncate to `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// One `ls` row: index, style or `img`, then a summary.
pub fn format_block(index: usize, block: &Block, dragging: bool) -> String {
    let marker = if dragging { '*' } else { ' ' };
    match &block.content {
        BlockContent::Text { content, style } => {
            let text = content.as_deref().unwrap_or("(empty)");
            let text = text.replace('\n', " ");
            format!(
                "{marker}{index:>3}  {:<4}{}",
                style.as_str(),
                truncate(&text, SUMMARY_WIDTH)
            )
        }
        BlockContent::Image { url, .. } => {
            let (w, h) = block.display_size().unwrap_or_default();
            format!(
                "{marker}{index:>3}  img {} ({w}x{h})",
                truncate(url, SUMMARY_WIDTH)
            )
        }
    }
}

/// The whole list, one row per block.
pub fn format_blocks(blocks: &[Block], dragged: Option<usize>) -> Vec<String> {
    if blocks.is_empty() {
        return vec!["(no blocks)".to_string()];
    }
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| format_block(i, block, dragged == Some(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{BlockId, TextStyle};

    fn text(id: i64, style: TextStyle, content: &str) -> Block {
        Block::new(BlockId::new(id), BlockContent::text(style, content), id, 1)
    }

    #[test]
    fn test_text_rows() {
        let block = text(1, TextStyle::H1, "Welcome to Folio");
        assert_eq!(format_block(0, &block, false), "   0  h1  Welcome to Folio");
        assert_eq!(format_block(12, &block, true), "* 12  h1  Welcome to Folio");
    }

    #[test]
    fn test_long_text_truncated() {
        let long = "x".repeat(SUMMARY_WIDTH + 10);
        let row = format_block(0, &text(1, TextStyle::Paragraph, &long), false);
        assert!(row.ends_with('…'));
        assert_eq!(row.chars().filter(|c| *c == 'x').count(), SUMMARY_WIDTH);
    }

    #[test]
    fn test_image_row_uses_display_size() {
        let mut block = Block::new(
            BlockId::new(3),
            BlockContent::Image {
                url: "/uploads/a.png".into(),
                width: Some(1800),
                height: Some(600),
            },
            2,
            1,
        );
        assert_eq!(format_block(2, &block, false), "   2  img /uploads/a.png (900x300)");

        block.content = BlockContent::image("/uploads/b.png");
        assert!(format_block(2, &block, false).ends_with("(800x400)"));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_blocks(&[], None), vec!["(no blocks)".to_string()]);
    }
}
