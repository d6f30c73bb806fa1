//! Ordered posting lists with skip pointers
//!
//! A posting list is a strictly ascending sequence of document ids kept in a
//! vector. Skip pointers live in a parallel vector of indices: position `i`
//! may point `⌊√n⌋` positions ahead, and every skip target is itself a
//! skip-marked position, so the marked nodes form a sparse chain.
//!
//! Skips are derived data. Any insertion invalidates them and
//! [`PostingList::build_skip`] recomputes them from the current contents.

use std::collections::HashSet;
use std::fmt;

use super::types::DocId;
use crate::error::{IndexError, Result};

/// Skip stride for a list of `n` elements: `⌊√n⌋`, at least 1
pub fn skip_stride(n: usize) -> usize {
    if n < 2 {
        return 1;
    }
    let mut s = (n as f64).sqrt() as usize;
    while s * s > n {
        s -= 1;
    }
    while (s + 1) * (s + 1) <= n {
        s += 1;
    }
    s.max(1)
}

/// Ascending, duplicate-free list of document ids
#[derive(Clone, Default)]
pub struct PostingList {
    docs: Vec<DocId>,
    /// Membership set for O(1) duplicate checks
    members: HashSet<DocId>,
    /// Skip target per position; empty until built, cleared on mutation
    skips: Vec<Option<usize>>,
}

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            docs: Vec::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            skips: Vec::new(),
        }
    }

    /// Insert a document id, keeping the list ascending.
    ///
    /// Returns `false` if the id was already present. Invalidates skips.
    pub fn add(&mut self, doc_id: DocId) -> bool {
        if !self.members.insert(doc_id) {
            return false;
        }
        self.skips.clear();

        match self.docs.last() {
            Some(&last) if doc_id < last => {
                let pos = self
                    .docs
                    .iter()
                    .position(|&d| d > doc_id)
                    .unwrap_or(self.docs.len());
                self.docs.insert(pos, doc_id);
            }
            _ => self.docs.push(doc_id),
        }
        true
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.members.contains(&doc_id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.docs
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.docs.iter().copied()
    }

    pub fn into_vec(self) -> Vec<DocId> {
        self.docs
    }

    /// Recompute skip pointers at stride `⌊√n⌋` over the current contents
    pub fn build_skip(&mut self) {
        let n = self.docs.len();
        self.skips.clear();
        self.skips.resize(n, None);

        let stride = skip_stride(n);
        let mut pos = 0;
        while pos + stride < n {
            self.skips[pos] = Some(pos + stride);
            pos += stride;
        }
    }

    /// Whether skips are built for the current contents
    pub fn has_skips(&self) -> bool {
        !self.docs.is_empty() && self.skips.len() == self.docs.len()
    }

    /// Skip target of position `pos`, if skips are built and `pos` is marked
    pub fn skip_of(&self, pos: usize) -> Option<usize> {
        self.skips.get(pos).copied().flatten()
    }

    /// Document ids at skip-marked positions
    pub fn skip_values(&self) -> Vec<DocId> {
        self.skips
            .iter()
            .zip(&self.docs)
            .filter(|(skip, _)| skip.is_some())
            .map(|(_, &doc)| doc)
            .collect()
    }

    /// Skip markers formatted as one postings-file line (without newline)
    pub fn skip_line(&self) -> String {
        join_ids(self.skip_values())
    }
}

impl PartialEq for PostingList {
    fn eq(&self, other: &Self) -> bool {
        self.docs == other.docs
    }
}

impl Eq for PostingList {}

impl fmt::Debug for PostingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.docs).finish()
    }
}

/// Space-separated ascending ids, the doc-id line format of postings files
impl fmt::Display for PostingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_ids(self.iter()))
    }
}

impl FromIterator<DocId> for PostingList {
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        let mut list = PostingList::new();
        for doc_id in iter {
            list.add(doc_id);
        }
        list
    }
}

impl Extend<DocId> for PostingList {
    fn extend<I: IntoIterator<Item = DocId>>(&mut self, iter: I) {
        for doc_id in iter {
            self.add(doc_id);
        }
    }
}

fn join_ids(ids: impl IntoIterator<Item = DocId>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Linear merge of two ascending lists, duplicates removed
pub fn union(left: &PostingList, right: &PostingList) -> PostingList {
    let (a, b) = (left.as_slice(), right.as_slice());
    let mut result = PostingList::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            result.add(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            result.add(a[i]);
            i += 1;
        } else {
            result.add(b[j]);
            j += 1;
        }
    }
    result.extend(a[i..].iter().copied());
    result.extend(b[j..].iter().copied());
    result
}

/// Two-pointer intersection that follows skip pointers where they are built.
///
/// The result has no skips built.
pub fn intersect(left: &PostingList, right: &PostingList) -> PostingList {
    let (a, b) = (left.as_slice(), right.as_slice());
    let mut result = PostingList::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            result.add(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            match left.skip_of(i) {
                Some(target) if a[target] < b[j] => i = target,
                _ => i += 1,
            }
        } else {
            match right.skip_of(j) {
                Some(target) if b[target] < a[i] => j = target,
                _ => j += 1,
            }
        }
    }
    result
}

/// Ids of `universe` not in `list`.
///
/// Every id of `list` must occur in `universe`; anything else means the index
/// and its document universe disagree, reported as [`IndexError::NotInUniverse`].
pub fn complement(list: &PostingList, universe: &PostingList) -> Result<PostingList> {
    let (a, u) = (list.as_slice(), universe.as_slice());
    let mut result = PostingList::with_capacity(u.len().saturating_sub(a.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < u.len() {
        if u[j] == a[i] {
            i += 1;
            j += 1;
        } else if u[j] < a[i] {
            result.add(u[j]);
            j += 1;
        } else {
            return Err(IndexError::NotInUniverse(a[i]));
        }
    }
    if let Some(&missing) = a.get(i) {
        return Err(IndexError::NotInUniverse(missing));
    }
    result.extend(u[j..].iter().copied());
    Ok(result)
}
