//! Text normalization for documents and query terms
//!
//! Indexing and retrieval only see canonical term strings. Anything that
//! turns raw text into those strings implements [`TextNormalizer`].

mod tokenizer;

pub use tokenizer::Tokenizer;

use std::collections::BTreeSet;

/// Turns raw text into canonical index terms
pub trait TextNormalizer {
    /// Distinct normalized terms of a document
    fn normalize(&self, text: &str) -> BTreeSet<String>;

    /// Normalize a single query word, `None` if nothing indexable remains
    fn normalize_query_term(&self, word: &str) -> Option<String>;
}
