use std::path::PathBuf;

use thiserror::Error;

use crate::index::DocId;

/// Main error type for index construction and retrieval
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Term not found in dictionary: {0}")]
    TermNotFound(String),

    #[error("Term has no postings pointer assigned: {0}")]
    PointerUnset(String),

    #[error("Document {0} is not part of the document universe")]
    NotInUniverse(DocId),

    #[error("Invalid term {0:?}: terms must be non-empty and contain no whitespace")]
    InvalidTerm(String),

    #[error("No blocks to merge")]
    NoBlocks,

    #[error("Merge worker failed: {0}")]
    MergeWorker(String),

    #[error("Block file missing: {}", .0.display())]
    MissingBlock(PathBuf),

    #[error("Corrupt postings file {}: {reason}", .path.display())]
    CorruptPostings { path: PathBuf, reason: String },

    #[error("Checksum mismatch for {}: expected {expected:#010x}, got {actual:#010x}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },

    #[error("Unsupported dictionary format version {actual}, expected {expected}")]
    IncompatibleDictionary { expected: u32, actual: u32 },

    #[error("Empty query")]
    EmptyQuery,

    #[error("Unbalanced parenthesis at token {0}")]
    UnbalancedParenthesis(usize),

    #[error("Query parse error: {0}")]
    QueryParse(String),
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// Build a corrupt-postings error for `path`
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::CorruptPostings {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error rejects a single query rather than the whole run
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            IndexError::EmptyQuery | IndexError::UnbalancedParenthesis(_) | IndexError::QueryParse(_)
        )
    }
}
