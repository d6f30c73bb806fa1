//! In-memory accumulation buffer for (term, doc-id) pairs
//!
//! The buffer is bounded by a pair count; once full it is drained into a
//! block by [`BlockWriter`](super::writer::BlockWriter).

use super::types::{DocId, TermDocPair};

#[derive(Debug)]
pub struct PairBuffer {
    pairs: Vec<TermDocPair>,
    capacity: usize,
}

impl PairBuffer {
    /// Buffer holding at most `capacity` pairs (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pairs: Vec::with_capacity(capacity.min(1 << 20)),
            capacity,
        }
    }

    /// Append a pair. Returns `true` once the buffer has reached capacity.
    pub fn push(&mut self, term: impl Into<String>, doc_id: DocId) -> bool {
        self.pairs.push(TermDocPair::new(term, doc_id));
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.pairs.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take all buffered pairs, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<TermDocPair> {
        std::mem::take(&mut self.pairs)
    }
}
