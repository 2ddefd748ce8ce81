//! SQLite persistence for blocks.
//!
//! One `blocks` table. Rows are ordered by `position`, then rowid, so equal
//! positions keep insertion order.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::path::Path;

use folio_types::{Block, BlockContent, BlockId, BlockKind, NewBlock, TextStyle};

use crate::seed::sample_drafts;

/// Database handle for block persistence.
pub struct BlockDb {
    conn: Connection,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    content TEXT,
    style TEXT,
    image_url TEXT,
    width INTEGER,
    height INTEGER,
    position INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_blocks_position ON blocks(position, id);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, type, content, style, image_url, width, height, position, created_at, updated_at
     FROM blocks";

/// Flattened column values for one block.
struct Columns<'a> {
    kind: &'static str,
    content: Option<&'a str>,
    style: Option<&'static str>,
    image_url: Option<&'a str>,
    width: Option<u32>,
    height: Option<u32>,
}

impl<'a> Columns<'a> {
    fn of(content: &'a BlockContent) -> Self {
        match content {
            BlockContent::Text { content, style } => Columns {
                kind: BlockKind::Text.as_str(),
                content: content.as_deref(),
                style: Some(style.as_str()),
                image_url: None,
                width: None,
                height: None,
            },
            BlockContent::Image { url, width, height } => Columns {
                kind: BlockKind::Image.as_str(),
                content: None,
                style: None,
                image_url: Some(url.as_str()),
                width: *width,
                height: *height,
            },
        }
    }
}

fn conversion_error(col: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, msg.into())
}

fn row_to_block(row: &Row<'_>) -> SqliteResult<Block> {
    let kind_str: String = row.get(1)?;
    let kind = BlockKind::from_str(&kind_str)
        .ok_or_else(|| conversion_error(1, format!("unknown block type {kind_str:?}")))?;

    let content = match kind {
        BlockKind::Text => {
            let style_str: Option<String> = row.get(3)?;
            BlockContent::Text {
                content: row.get(2)?,
                style: style_str
                    .as_deref()
                    .and_then(TextStyle::from_str)
                    .unwrap_or_default(),
            }
        }
        BlockKind::Image => BlockContent::Image {
            url: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            width: row.get(5)?,
            height: row.get(6)?,
        },
    };

    let created_at: i64 = row.get(8)?;
    let updated_at: i64 = row.get(9)?;
    Ok(Block {
        id: BlockId::new(row.get(0)?),
        content,
        position: row.get(7)?,
        created_at: created_at.max(0) as u64,
        updated_at: updated_at.max(created_at).max(0) as u64,
    })
}

impl BlockDb {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Number of stored blocks.
    pub fn count(&self) -> SqliteResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))
    }

    /// All blocks, ascending by position, ties by insertion order.
    pub fn list_blocks(&self) -> SqliteResult<Vec<Block>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY position ASC, id ASC"))?;
        let rows = stmt.query_map([], row_to_block)?;
        rows.collect()
    }

    /// Get a block by ID.
    pub fn get_block(&self, id: BlockId) -> SqliteResult<Option<Block>> {
        self.conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.get()],
                row_to_block,
            )
            .optional()
    }

    /// Insert a validated block, returning it with its new ID.
    pub fn insert_block(&self, new: NewBlock, now: u64) -> SqliteResult<Block> {
        let cols = Columns::of(&new.content);
        self.conn.execute(
            "INSERT INTO blocks (type, content, style, image_url, width, height, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                cols.kind,
                cols.content,
                cols.style,
                cols.image_url,
                cols.width,
                cols.height,
                new.position,
                now as i64,
            ],
        )?;
        let id = BlockId::new(self.conn.last_insert_rowid());
        Ok(new.into_block(id, now))
    }

    /// Write every mutable column of `block` back to its row.
    ///
    /// Returns `false` if no row has that ID.
    pub fn write_block(&self, block: &Block) -> SqliteResult<bool> {
        let cols = Columns::of(&block.content);
        let changed = self.conn.execute(
            "UPDATE blocks
             SET content = ?1, style = ?2, image_url = ?3, width = ?4, height = ?5,
                 position = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                cols.content,
                cols.style,
                cols.image_url,
                cols.width,
                cols.height,
                block.position,
                block.updated_at as i64,
                block.id.get(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Insert the sample document if the table is empty.
    ///
    /// Returns the number of blocks inserted.
    pub fn seed_if_empty(&self, now: u64) -> SqliteResult<usize> {
        if self.count()? > 0 {
            return Ok(0);
        }
        let mut inserted = 0;
        for draft in sample_drafts() {
            let Ok(new) = draft.validate() else {
                continue;
            };
            self.insert_block(new, now)?;
            inserted += 1;
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{BlockDraft, BlockPatch};

    fn new_text(position: i64, text: &str) -> NewBlock {
        BlockDraft::text(TextStyle::Paragraph, text, position)
            .validate()
            .unwrap()
    }

    #[test]
    fn test_block_crud() {
        let db = BlockDb::in_memory().unwrap();

        let block = db.insert_block(new_text(0, "hello"), 100).unwrap();
        assert_eq!(block.id, BlockId::new(1));
        assert_eq!(block.created_at, 100);

        let loaded = db.get_block(block.id).unwrap().unwrap();
        assert_eq!(loaded, block);

        let mut edited = loaded.clone();
        edited.apply_patch(&BlockPatch::content("bye")).unwrap();
        edited.touch(200);
        assert!(db.write_block(&edited).unwrap());

        let loaded = db.get_block(block.id).unwrap().unwrap();
        assert_eq!(loaded.text(), Some("bye"));
        assert_eq!(loaded.updated_at, 200);
        assert_eq!(loaded.created_at, 100);

        assert!(db.get_block(BlockId::new(99)).unwrap().is_none());
    }

    #[test]
    fn test_write_missing_block_reports_false() {
        let db = BlockDb::in_memory().unwrap();
        let ghost = new_text(0, "ghost").into_block(BlockId::new(42), 1);
        assert!(!db.write_block(&ghost).unwrap());
    }

    #[test]
    fn test_list_orders_by_position_then_insertion() {
        let db = BlockDb::in_memory().unwrap();
        db.insert_block(new_text(5, "c"), 1).unwrap();
        db.insert_block(new_text(1, "a"), 1).unwrap();
        db.insert_block(new_text(5, "d"), 1).unwrap();
        db.insert_block(new_text(2, "b"), 1).unwrap();

        let texts: Vec<_> = db
            .list_blocks()
            .unwrap()
            .iter()
            .map(|b| b.text().unwrap().to_string())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_image_roundtrip() {
        let db = BlockDb::in_memory().unwrap();
        let new = BlockDraft::image("/uploads/x.png", Some(640), None, 0)
            .validate()
            .unwrap();
        let block = db.insert_block(new, 1).unwrap();
        let loaded = db.get_block(block.id).unwrap().unwrap();
        assert_eq!(
            loaded.content,
            BlockContent::Image {
                url: "/uploads/x.png".into(),
                width: Some(640),
                height: None,
            }
        );
    }

    #[test]
    fn test_seed_only_when_empty() {
        let db = BlockDb::in_memory().unwrap();
        assert_eq!(db.seed_if_empty(1).unwrap(), 5);
        assert_eq!(db.seed_if_empty(2).unwrap(), 0);
        let blocks = db.list_blocks().unwrap();
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0].text(), Some("Welcome to Folio"));
        assert_eq!(blocks[2].kind(), BlockKind::Image);
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.db");
        {
            let db = BlockDb::open(&path).unwrap();
            db.insert_block(new_text(0, "persisted"), 1).unwrap();
        }
        let db = BlockDb::open(&path).unwrap();
        let blocks = db.list_blocks().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), Some("persisted"));
    }
}
