//! # folio-store
//!
//! The block store: an ordered collection of blocks keyed by [`BlockId`] with
//! exactly three operations: `list`, `create` and `update`.
//!
//! - [`BlockStore`] is the contract every consumer codes against.
//! - [`SqliteBlockStore`] is the authoritative store behind the REST server
//!   (feature `sqlite`, on by default).
//! - [`MemoryBlockStore`] is ephemeral, for offline sessions and tests; it can
//!   be told to fail specific updates.
//!
//! [`BlockId`]: folio_types::BlockId

pub mod error;
pub mod memory;
pub mod seed;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod db;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryBlockStore;
pub use seed::sample_drafts;
pub use store::{BlockEvent, BlockStore};

#[cfg(feature = "sqlite")]
pub use db::BlockDb;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBlockStore;
