//! Block writer: turns a batch of (term, doc-id) pairs into a finalized block
//!
//! Pairs are grouped by term, each group becomes a posting list with skips
//! built, and records are written in term order. The dictionary file is
//! written last, so a block without a dictionary was never finished.

use std::collections::BTreeMap;

use tracing::debug;

use super::block::Block;
use super::postings::PostingList;
use super::store::{BlockStore, DictionaryFile, PostingsWriter};
use super::term_dict::TermDictionary;
use super::types::{is_valid_term, BlockId, TermDocPair};
use crate::error::{IndexError, Result};

/// Writer for one block
pub struct BlockWriter {
    block_id: BlockId,
}

impl BlockWriter {
    pub fn new(block_id: BlockId) -> Self {
        Self { block_id }
    }

    /// Write a block from buffered pairs
    pub fn write_pairs(&self, store: &BlockStore, pairs: Vec<TermDocPair>) -> Result<Block> {
        let mut dictionary = TermDictionary::new();
        let mut postings: BTreeMap<String, PostingList> = BTreeMap::new();
        let pair_count = pairs.len();

        for pair in pairs {
            if !is_valid_term(&pair.term) {
                return Err(IndexError::InvalidTerm(pair.term));
            }
            if !dictionary.contains(&pair.term) {
                dictionary.add_term(&pair.term);
            }
            postings.entry(pair.term).or_default().add(pair.doc_id);
        }

        let postings_path = store.postings_path(self.block_id);
        let mut writer = PostingsWriter::create(&postings_path)?;
        for (term, list) in postings.iter_mut() {
            list.build_skip();
            let pointer = writer.write_list(term, list)?;
            dictionary.set_pointer(term, pointer)?;
            dictionary.set_frequency(term, list.len() as u32)?;
        }
        let checksum = writer.finish()?;

        let term_count = dictionary.len();
        DictionaryFile::new(dictionary, checksum).write(&store.dictionary_path(self.block_id))?;

        debug!(
            block = %self.block_id,
            pairs = pair_count,
            terms = term_count,
            "block written"
        );
        Ok(Block::new(store, self.block_id, term_count))
    }

    /// Write a block with no terms
    pub fn write_empty(&self, store: &BlockStore) -> Result<Block> {
        self.write_pairs(store, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn pairs(raw: &[(&str, u32)]) -> Vec<TermDocPair> {
        raw.iter().map(|&(t, d)| TermDocPair::new(t, d)).collect()
    }

    #[test]
    fn test_write_block_layout() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();

        let block = BlockWriter::new(BlockId::new(0))
            .write_pairs(
                &store,
                pairs(&[("dog", 2), ("cat", 3), ("cat", 1), ("dog", 1), ("cat", 1)]),
            )
            .unwrap();

        assert_eq!(block.term_count, 2);
        let content = fs::read_to_string(&block.postings_path).unwrap();
        assert_eq!(content, "cat 1 3\n1\ndog 1 2\n1\n");

        let reader = block.open().unwrap();
        let dict = reader.dictionary();
        assert_eq!(dict.frequency("cat"), Some(2));
        assert_eq!(dict.pointer("cat").unwrap(), 1);
        assert_eq!(dict.frequency("dog"), Some(2));
        assert_eq!(dict.pointer("dog").unwrap(), 3);
        assert_eq!(reader.read_list("cat").unwrap().as_slice(), &[1, 3]);
    }

    #[test]
    fn test_roundtrip_preserves_mapping() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();

        let mut input = Vec::new();
        for doc in 0..50u32 {
            for term in ["alpha", "beta", "gamma", "delta"] {
                if doc % (term.len() as u32) == 0 {
                    input.push(TermDocPair::new(term, doc));
                }
            }
        }
        let mut expected: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for pair in &input {
            expected.entry(pair.term.clone()).or_default().push(pair.doc_id);
        }

        let block = BlockWriter::new(BlockId::new(5))
            .write_pairs(&store, input)
            .unwrap();
        let reader = block.open().unwrap();

        assert_eq!(reader.dictionary().len(), expected.len());
        for (term, ids) in expected {
            assert_eq!(reader.dictionary().frequency(&term), Some(ids.len() as u32));
            assert_eq!(reader.read_list(&term).unwrap().into_vec(), ids);
        }
    }

    #[test]
    fn test_empty_block() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();

        let block = BlockWriter::new(BlockId::new(0)).write_empty(&store).unwrap();
        assert_eq!(block.term_count, 0);
        assert_eq!(fs::read_to_string(&block.postings_path).unwrap(), "");
        assert!(block.open().unwrap().dictionary().is_empty());
    }

    #[test]
    fn test_invalid_term_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();

        let result = BlockWriter::new(BlockId::new(0)).write_pairs(&store, pairs(&[("a b", 1)]));
        assert!(matches!(result, Err(IndexError::InvalidTerm(_))));
    }
}
