//! Blocks: numbered partial indexes (dictionary + postings file)

use std::fs;
use std::io;
use std::path::PathBuf;

use super::postings::PostingList;
use super::store::{BlockStore, DictionaryFile, PostingsReader};
use super::term_dict::TermDictionary;
use super::types::BlockId;
use crate::error::Result;

/// A finalized block on durable storage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub dictionary_path: PathBuf,
    pub postings_path: PathBuf,
    /// Number of distinct terms in the block
    pub term_count: usize,
}

impl Block {
    pub fn new(store: &BlockStore, id: BlockId, term_count: usize) -> Self {
        Self {
            id,
            dictionary_path: store.dictionary_path(id),
            postings_path: store.postings_path(id),
            term_count,
        }
    }

    /// Load the dictionary and open the postings file for lookups.
    ///
    /// Fails if either file is missing or the postings checksum does not
    /// match the one recorded in the dictionary.
    pub fn open(&self) -> Result<BlockReader> {
        let file = DictionaryFile::read(&self.dictionary_path)?;
        let postings = PostingsReader::open_verified(&self.postings_path, file.postings_checksum)?;
        Ok(BlockReader {
            block: self.clone(),
            dictionary: file.dictionary,
            postings,
        })
    }

    /// Delete both block files; already-missing files are ignored
    pub fn remove(&self) -> Result<()> {
        for path in [&self.dictionary_path, &self.postings_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// A block with its dictionary in memory and postings fetched on demand
pub struct BlockReader {
    block: Block,
    dictionary: TermDictionary,
    postings: PostingsReader,
}

impl BlockReader {
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    /// Posting list of a term known to be in this block
    pub fn read_list(&self, term: &str) -> Result<PostingList> {
        let pointer = self.dictionary.pointer(term)?;
        self.postings.read_list(pointer, term)
    }

    /// Stored doc-id field and skip line of a term known to be in this block
    pub fn read_raw(&self, term: &str) -> Result<(String, String)> {
        let pointer = self.dictionary.pointer(term)?;
        self.postings.read_raw(pointer, term)
    }
}
