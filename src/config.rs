use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of (term, doc-id) pairs held in memory before a block is flushed
pub const DEFAULT_BLOCK_SIZE: usize = 50_000;

/// File name of the all-document-ids file when no explicit path is given
pub const DEFAULT_DOC_IDS_FILE: &str = "all-ids.txt";

/// Block-based indexer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Maximum (term, doc-id) pairs per block
    pub block_size: usize,
    /// Directory holding intermediate block files
    pub work_dir: PathBuf,
    /// Pairwise merges executed concurrently within one merge round
    pub merge_workers: usize,
    /// Keep merged-away blocks on disk instead of deleting them
    pub keep_intermediate: bool,
    pub tokenizer_config: TokenizerConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            work_dir: PathBuf::from("tmp"),
            merge_workers: 1,
            keep_intermediate: false,
            tokenizer_config: TokenizerConfig::default(),
        }
    }
}

impl IndexerConfig {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Default::default()
        }
    }

    /// Set the block-size threshold (clamped to at least one pair)
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Set the number of concurrent pairwise merges per round
    pub fn with_merge_workers(mut self, workers: usize) -> Self {
        self.merge_workers = workers.max(1);
        self
    }

    pub fn with_keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    pub fn with_tokenizer(mut self, config: TokenizerConfig) -> Self {
        self.tokenizer_config = config;
        self
    }
}

/// Tokenizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: false,
            stem: true,
            min_token_length: 1,
            max_token_length: 64,
        }
    }
}

/// Locations of a finished index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPaths {
    pub dictionary: PathBuf,
    pub postings: PathBuf,
    pub doc_ids: PathBuf,
}

impl IndexPaths {
    /// Paths with the all-document-ids file placed beside the dictionary
    pub fn new(dictionary: impl Into<PathBuf>, postings: impl Into<PathBuf>) -> Self {
        let dictionary = dictionary.into();
        let doc_ids = default_doc_ids_path(&dictionary);
        Self {
            dictionary,
            postings: postings.into(),
            doc_ids,
        }
    }

    pub fn with_doc_ids(mut self, doc_ids: impl Into<PathBuf>) -> Self {
        self.doc_ids = doc_ids.into();
        self
    }
}

fn default_doc_ids_path(dictionary: &Path) -> PathBuf {
    match dictionary.parent() {
        Some(parent) => parent.join(DEFAULT_DOC_IDS_FILE),
        None => PathBuf::from(DEFAULT_DOC_IDS_FILE),
    }
}
