pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod tokenizer;

pub use config::{IndexPaths, IndexerConfig, TokenizerConfig};
pub use error::{IndexError, Result};
pub use index::{BuildSummary, DocId, IndexBuilder, IndexHandle, PostingList};
pub use query::{Evaluator, Query, QueryRunner, RunSummary};
pub use tokenizer::{TextNormalizer, Tokenizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
