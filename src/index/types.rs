//! Core types shared by the indexer and the query side

use serde::{Deserialize, Serialize};
use std::fmt;

/// Document identifier as it appears in postings files
pub type DocId = u32;

/// Block sequence number (monotonically increasing over one build)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl BlockId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block_{}", self.0)
    }
}

/// Hands out block sequence numbers without reuse
#[derive(Debug, Default)]
pub struct BlockIdAllocator {
    next: BlockId,
}

impl BlockIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> BlockId {
        let id = self.next;
        self.next = id.next();
        id
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u64 {
        self.next.0
    }
}

/// A (term, document) occurrence produced during partitioning
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TermDocPair {
    pub term: String,
    pub doc_id: DocId,
}

impl TermDocPair {
    pub fn new(term: impl Into<String>, doc_id: DocId) -> Self {
        Self {
            term: term.into(),
            doc_id,
        }
    }
}

/// Terms are stored as the first field of a space-separated line
pub fn is_valid_term(term: &str) -> bool {
    !term.is_empty() && !term.chars().any(char::is_whitespace)
}
