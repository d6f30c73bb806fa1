//! Term dictionary: term -> (document frequency, postings pointer)
//!
//! Kept in a `BTreeMap` so iteration is always in lexicographic term order,
//! which is the order records are laid out in postings files.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Dictionary entry for a single term
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    /// Number of documents containing the term
    pub doc_frequency: u32,
    /// 1-indexed line of the term's doc-id line in the postings file
    pub pointer: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDictionary {
    terms: BTreeMap<String, TermEntry>,
}

impl TermDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more document for `term`, creating the entry if needed
    pub fn add_term(&mut self, term: &str) {
        match self.terms.get_mut(term) {
            Some(entry) => entry.doc_frequency += 1,
            None => {
                self.terms.insert(
                    term.to_string(),
                    TermEntry {
                        doc_frequency: 1,
                        pointer: None,
                    },
                );
            }
        }
    }

    /// Document frequency of `term`, `None` if the term is absent
    pub fn frequency(&self, term: &str) -> Option<u32> {
        self.terms.get(term).map(|e| e.doc_frequency)
    }

    pub fn set_frequency(&mut self, term: &str, frequency: u32) -> Result<()> {
        self.entry_mut(term)?.doc_frequency = frequency;
        Ok(())
    }

    /// Postings pointer of `term`.
    ///
    /// Only requested for terms known to be present, so both a missing term
    /// and an unassigned pointer are errors.
    pub fn pointer(&self, term: &str) -> Result<u64> {
        self.terms
            .get(term)
            .ok_or_else(|| IndexError::TermNotFound(term.to_string()))?
            .pointer
            .ok_or_else(|| IndexError::PointerUnset(term.to_string()))
    }

    pub fn set_pointer(&mut self, term: &str, pointer: u64) -> Result<()> {
        self.entry_mut(term)?.pointer = Some(pointer);
        Ok(())
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in lexicographic order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TermEntry> {
        self.terms.iter()
    }

    /// Dictionary of a merged block.
    ///
    /// Shared terms get the sum of both frequencies, the rest keep the
    /// frequency of their only side. Pointers start unassigned. Neither input
    /// is modified.
    pub fn merged(left: &TermDictionary, right: &TermDictionary) -> TermDictionary {
        let mut terms = BTreeMap::new();
        for (term, entry) in left.iter() {
            let other = right.frequency(term).unwrap_or(0);
            terms.insert(
                term.clone(),
                TermEntry {
                    doc_frequency: entry.doc_frequency + other,
                    pointer: None,
                },
            );
        }
        for (term, entry) in right.iter() {
            terms.entry(term.clone()).or_insert(TermEntry {
                doc_frequency: entry.doc_frequency,
                pointer: None,
            });
        }
        TermDictionary { terms }
    }

    fn entry_mut(&mut self, term: &str) -> Result<&mut TermEntry> {
        self.terms
            .get_mut(term)
            .ok_or_else(|| IndexError::TermNotFound(term.to_string()))
    }
}

impl<'a> IntoIterator for &'a TermDictionary {
    type Item = (&'a String, &'a TermEntry);
    type IntoIter = btree_map::Iter<'a, String, TermEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}
