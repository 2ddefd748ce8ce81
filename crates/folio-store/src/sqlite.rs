//! SQLite-backed block store.
//!
//! Wraps [`BlockDb`] behind a mutex and runs every query on the blocking
//! pool. Successful writes are broadcast as [`BlockEvent`]s.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use folio_types::{now_millis, Block, BlockDraft, BlockId, BlockPatch};

use crate::db::BlockDb;
use crate::error::{StoreError, StoreResult};
use crate::store::{BlockEvent, BlockStore};

/// Capacity of the change-event channel.
const EVENT_CAPACITY: usize = 1024;

/// The authoritative store.
#[derive(Clone)]
pub struct SqliteBlockStore {
    db: Arc<Mutex<BlockDb>>,
    event_tx: broadcast::Sender<BlockEvent>,
}

impl SqliteBlockStore {
    /// Open (or create) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let db = BlockDb::open(path)?;
        info!(path = %path.display(), "opened block database");
        Ok(Self::from_db(db))
    }

    /// Fresh in-memory database.
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::from_db(BlockDb::in_memory()?))
    }

    fn from_db(db: BlockDb) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            db: Arc::new(Mutex::new(db)),
            event_tx,
        }
    }

    /// Insert the sample document if the database has no blocks.
    pub fn seed_if_empty(&self) -> StoreResult<usize> {
        let inserted = self.db.lock().seed_if_empty(now_millis())?;
        if inserted > 0 {
            info!(inserted, "seeded empty database with sample blocks");
        }
        Ok(inserted)
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<BlockEvent> {
        self.event_tx.subscribe()
    }

    async fn with_db<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&BlockDb) -> StoreResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db.lock()))
            .await
            .map_err(|e| StoreError::Unavailable(format!("database task failed: {e}")))?
    }

    fn emit(&self, event: BlockEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

#[async_trait]
impl BlockStore for SqliteBlockStore {
    #[instrument(name = "store.list", skip(self))]
    async fn list(&self) -> StoreResult<Vec<Block>> {
        self.with_db(|db| Ok(db.list_blocks()?)).await
    }

    #[instrument(name = "store.create", skip(self, draft))]
    async fn create(&self, draft: BlockDraft) -> StoreResult<Block> {
        let new = draft.validate()?;
        let block = self
            .with_db(move |db| Ok(db.insert_block(new, now_millis())?))
            .await?;
        debug!(id = %block.id, position = block.position, "created block");
        self.emit(BlockEvent::Created {
            block: block.clone(),
        });
        Ok(block)
    }

    #[instrument(name = "store.update", skip(self, patch), fields(id = %id))]
    async fn update(&self, id: BlockId, patch: BlockPatch) -> StoreResult<Block> {
        if patch.is_empty() {
            return Err(StoreError::NoOp);
        }
        let block = self
            .with_db(move |db| {
                let mut block = db.get_block(id)?.ok_or(StoreError::NotFound(id))?;
                block.apply_patch(&patch)?;
                block.touch(now_millis());
                if !db.write_block(&block)? {
                    return Err(StoreError::NotFound(id));
                }
                Ok(block)
            })
            .await?;
        debug!(position = block.position, "updated block");
        self.emit(BlockEvent::Updated {
            block: block.clone(),
        });
        Ok(block)
    }
}
