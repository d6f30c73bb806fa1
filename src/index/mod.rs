//! Inverted index construction and storage
//!
//! - [`postings`]: ascending posting lists with skip pointers and set algebra
//! - [`term_dict`]: term -> (frequency, pointer) dictionary
//! - [`store`]: postings/dictionary file formats and atomic file handling
//! - [`writer`], [`merge`], [`builder`]: block-based construction
//! - [`reader`]: the read-only handle used by queries

pub mod block;
pub mod buffer;
pub mod builder;
pub mod merge;
pub mod postings;
pub mod reader;
pub mod store;
pub mod term_dict;
pub mod types;
pub mod writer;

pub use block::{Block, BlockReader};
pub use builder::{BuildPhase, BuildSummary, IndexBuilder};
pub use merge::{merge_two_blocks, BlockMerger};
pub use postings::{complement, intersect, skip_stride, union, PostingList};
pub use reader::IndexHandle;
pub use store::{BlockStore, DictionaryFile, PostingsReader, PostingsWriter};
pub use term_dict::{TermDictionary, TermEntry};
pub use types::{BlockId, BlockIdAllocator, DocId, TermDocPair};
pub use writer::BlockWriter;
