//! Block identifier.
//!
//! Blocks are keyed by the SQLite rowid the store assigns on insert. The ID is
//! stable for the block's lifetime and opaque to clients: they never invent
//! one, they only echo back what `list` or `create` returned.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A store-assigned block identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(i64);

impl BlockId {
    /// Wrap a raw rowid.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw rowid, for SQL parameters and URL paths.
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for BlockId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<BlockId> for i64 {
    fn from(id: BlockId) -> i64 {
        id.0
    }
}

impl FromStr for BlockId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}
