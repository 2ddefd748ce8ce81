//! Sample document for a fresh database.

use folio_types::{BlockDraft, TextStyle};

/// The five blocks a new database starts with.
pub fn sample_drafts() -> Vec<BlockDraft> {
    vec![
        BlockDraft::text(TextStyle::H1, "Welcome to Folio", 0),
        BlockDraft::text(
            TextStyle::Paragraph,
            "A small block editor: text and images, drag to reorder, undo anything.",
            1,
        ),
        BlockDraft::image("https://picsum.photos/800/400", Some(800), Some(400), 2),
        BlockDraft::text(TextStyle::H2, "Features", 3),
        BlockDraft::text(
            TextStyle::Paragraph,
            "Blocks load from SQLite and every change is saved as you make it.",
            4,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_drafts_are_valid_and_dense() {
        let drafts = sample_drafts();
        assert_eq!(drafts.len(), 5);
        for (i, draft) in drafts.iter().enumerate() {
            let new = draft.validate().expect("sample draft validates");
            assert_eq!(new.position, i as i64);
        }
    }
}
