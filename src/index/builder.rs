//! Block-based index construction: PARTITION -> MERGE -> FINALIZE
//!
//! Documents arrive already reduced to term sets. Their (term, doc-id) pairs
//! fill a bounded buffer that is flushed into a block whenever it is full.
//! [`IndexBuilder::finish`] flushes the remainder, merges all blocks
//! pairwise and moves the surviving block to the output paths.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::block::Block;
use super::buffer::PairBuffer;
use super::merge::BlockMerger;
use super::postings::PostingList;
use super::store::{stage_file, write_doc_ids, BlockStore, StagedFile};
use super::types::{is_valid_term, BlockIdAllocator, DocId};
use super::writer::BlockWriter;
use crate::config::{IndexPaths, IndexerConfig, DEFAULT_DOC_IDS_FILE};
use crate::error::{IndexError, Result};
use crate::tokenizer::TextNormalizer;

/// Construction phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildPhase {
    Partition,
    Merge,
    Finalize,
}

/// Outcome of a completed build
#[derive(Clone, Debug)]
pub struct BuildSummary {
    pub documents: usize,
    pub blocks_written: usize,
    pub merges: usize,
    pub terms: usize,
    pub paths: IndexPaths,
}

pub struct IndexBuilder {
    config: IndexerConfig,
    store: BlockStore,
    buffer: PairBuffer,
    blocks: Vec<Block>,
    ids: BlockIdAllocator,
    /// Every document id seen so far
    universe: PostingList,
    phase: BuildPhase,
}

impl IndexBuilder {
    pub fn new(config: IndexerConfig) -> Result<Self> {
        let store = BlockStore::new(&config.work_dir)?;
        let buffer = PairBuffer::new(config.block_size);
        Ok(Self {
            config,
            store,
            buffer,
            blocks: Vec::new(),
            ids: BlockIdAllocator::new(),
            universe: PostingList::new(),
            phase: BuildPhase::Partition,
        })
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn document_count(&self) -> usize {
        self.universe.len()
    }

    /// Blocks flushed so far, in creation order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Add one document given its normalized terms.
    ///
    /// Repeated terms count once. The document joins the universe even if it
    /// has no terms.
    pub fn add_document<I, S>(&mut self, doc_id: DocId, terms: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: BTreeSet<String> = terms.into_iter().map(Into::into).collect();
        if let Some(bad) = terms.iter().find(|t| !is_valid_term(t)) {
            return Err(IndexError::InvalidTerm(bad.clone()));
        }

        self.universe.add(doc_id);
        for term in terms {
            if self.buffer.push(term, doc_id) {
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Normalize raw text and add it as document `doc_id`
    pub fn add_text<N: TextNormalizer + ?Sized>(
        &mut self,
        doc_id: DocId,
        text: &str,
        normalizer: &N,
    ) -> Result<()> {
        self.add_document(doc_id, normalizer.normalize(text))
    }

    /// Index every file in `dir` whose name is a document id.
    ///
    /// Files are taken in ascending id order. Unreadable documents and
    /// non-numeric names are logged and skipped. Returns the number of
    /// documents indexed.
    pub fn index_directory<N: TextNormalizer + ?Sized>(
        &mut self,
        dir: &Path,
        normalizer: &N,
    ) -> Result<usize> {
        let mut documents: Vec<(DocId, std::path::PathBuf)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            match name.to_str().and_then(|n| n.parse::<DocId>().ok()) {
                Some(doc_id) => documents.push((doc_id, entry.path())),
                None => warn!(file = ?name, "skipping file without a numeric document id"),
            }
        }
        documents.sort();

        let mut indexed = 0;
        for (doc_id, path) in documents {
            let text = match fs::read(&path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!(doc_id, path = %path.display(), error = %e, "cannot read document, skipping");
                    continue;
                }
            };
            self.add_text(doc_id, &text, normalizer)?;
            indexed += 1;
        }
        info!(documents = indexed, dir = %dir.display(), "partitioning finished");
        Ok(indexed)
    }

    /// Write the buffered pairs as a new block (no-op when empty)
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let pairs = self.buffer.drain();
        let block = BlockWriter::new(self.ids.allocate()).write_pairs(&self.store, pairs)?;
        debug!(block = %block.id, terms = block.term_count, "buffer flushed");
        self.blocks.push(block);
        Ok(())
    }

    /// Flush the remainder, merge all blocks and move the result to `paths`
    pub fn finish(mut self, paths: &IndexPaths) -> Result<BuildSummary> {
        self.flush()?;
        if self.blocks.is_empty() {
            let block = BlockWriter::new(self.ids.allocate()).write_empty(&self.store)?;
            self.blocks.push(block);
        }
        let blocks_written = self.blocks.len();

        let universe_path = self.store.base_dir().join(DEFAULT_DOC_IDS_FILE);
        write_doc_ids(&universe_path, &self.universe)?;

        self.phase = BuildPhase::Merge;
        info!(blocks = blocks_written, documents = self.universe.len(), "merging blocks");
        let blocks = std::mem::take(&mut self.blocks);
        let (final_block, merges) = BlockMerger::new(&self.store)
            .with_workers(self.config.merge_workers)
            .with_keep_intermediate(self.config.keep_intermediate)
            .merge_all(blocks, &mut self.ids)?;

        self.phase = BuildPhase::Finalize;
        let outputs = [
            (&final_block.dictionary_path, &paths.dictionary),
            (&final_block.postings_path, &paths.postings),
            (&universe_path, &paths.doc_ids),
        ];
        // every output is staged before any of them takes its final name
        let mut staged: Vec<StagedFile> = Vec::with_capacity(outputs.len());
        for (from, to) in outputs {
            match stage_file(from, to) {
                Ok(file) => staged.push(file),
                Err(e) => {
                    for file in staged.drain(..).rev() {
                        let dest = file.dest().to_path_buf();
                        if let Err(err) = file.rollback() {
                            warn!(output = %dest.display(), error = %err, "failed to unstage output");
                        }
                    }
                    return Err(e);
                }
            }
        }
        for file in staged {
            file.commit()?;
        }
        if !self.config.keep_intermediate {
            self.store.remove_if_empty()?;
        }

        info!(
            dictionary = %paths.dictionary.display(),
            postings = %paths.postings.display(),
            doc_ids = %paths.doc_ids.display(),
            "index written"
        );
        Ok(BuildSummary {
            documents: self.universe.len(),
            blocks_written,
            merges,
            terms: final_block.term_count,
            paths: paths.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::reader::IndexHandle;
    use crate::index::store::tmp_path;
    use crate::index::types::BlockId;
    use tempfile::TempDir;

    fn config(tmp: &TempDir, block_size: usize) -> IndexerConfig {
        IndexerConfig::new(tmp.path().join("work")).with_block_size(block_size)
    }

    fn paths(tmp: &TempDir) -> IndexPaths {
        IndexPaths::new(tmp.path().join("dictionary"), tmp.path().join("postings"))
    }

    #[test]
    fn test_partition_flushes_at_threshold() {
        let tmp = TempDir::new().unwrap();
        let mut builder = IndexBuilder::new(config(&tmp, 2)).unwrap();
        assert_eq!(builder.phase(), BuildPhase::Partition);

        builder.add_document(1, ["cat", "dog"]).unwrap();
        assert_eq!(builder.blocks().len(), 1);
        builder.add_document(2, ["dog", "bird", "dog"]).unwrap();
        assert_eq!(builder.blocks().len(), 2);
        builder.add_document(3, ["cat"]).unwrap();
        assert_eq!(builder.blocks().len(), 2);

        let summary = builder.finish(&paths(&tmp)).unwrap();
        assert_eq!(summary.blocks_written, 3);
        assert_eq!(summary.merges, 2);
        assert_eq!(summary.documents, 3);
        assert_eq!(summary.terms, 3);
        assert!(!tmp.path().join("work").exists());

        let index = IndexHandle::open(&summary.paths).unwrap();
        assert_eq!(index.posting_list("cat").unwrap().as_slice(), &[1, 3]);
        assert_eq!(index.posting_list("dog").unwrap().as_slice(), &[1, 2]);
        assert_eq!(index.universe().as_slice(), &[1, 2, 3]);
        index.verify().unwrap();
    }

    #[test]
    fn test_empty_collection_builds_empty_index() {
        let tmp = TempDir::new().unwrap();
        let builder = IndexBuilder::new(config(&tmp, 10)).unwrap();
        let summary = builder.finish(&paths(&tmp)).unwrap();

        assert_eq!(summary.documents, 0);
        assert_eq!(summary.terms, 0);
        let index = IndexHandle::open(&summary.paths).unwrap();
        assert!(index.universe().is_empty());
        assert!(index.posting_list("cat").unwrap().is_empty());
    }

    #[test]
    fn test_document_without_terms_joins_universe() {
        let tmp = TempDir::new().unwrap();
        let mut builder = IndexBuilder::new(config(&tmp, 10)).unwrap();
        builder.add_document(4, Vec::<String>::new()).unwrap();
        builder.add_document(2, ["cat"]).unwrap();

        let summary = builder.finish(&paths(&tmp)).unwrap();
        let index = IndexHandle::open(&summary.paths).unwrap();
        assert_eq!(index.universe().as_slice(), &[2, 4]);
    }

    #[test]
    fn test_failed_finalize_leaves_no_partial_index() {
        let tmp = TempDir::new().unwrap();
        let mut builder = IndexBuilder::new(config(&tmp, 2)).unwrap();
        builder.add_document(1, ["cat", "dog"]).unwrap();
        builder.add_document(2, ["dog"]).unwrap();

        let paths = IndexPaths::new(
            tmp.path().join("dictionary"),
            tmp.path().join("missing").join("postings"),
        );
        let result = builder.finish(&paths);
        assert!(matches!(result, Err(IndexError::Io(_))));
        assert!(!paths.dictionary.exists());
        assert!(!tmp_path(&paths.dictionary).exists());
        assert!(!paths.doc_ids.exists());
        // the merged block is back where the merge left it
        let merged = BlockStore::new(tmp.path().join("work")).unwrap().dictionary_path(BlockId::new(2));
        assert!(merged.exists());
    }

    #[test]
    fn test_insertion_order_does_not_change_the_index() {
        let words = ["ant", "bee", "cow", "doe", "eel", "fox"];
        let docs: Vec<(DocId, Vec<&str>)> = (1..=30u32)
            .map(|id| {
                let terms = words
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| (id as usize + i * 5) % 4 == 0 || (id as usize * i) % 7 == 1)
                    .map(|(_, w)| *w)
                    .collect();
                (id, terms)
            })
            .collect();

        let build = |tmp: &TempDir, order: &[&(DocId, Vec<&str>)]| {
            let mut builder = IndexBuilder::new(config(tmp, 2)).unwrap();
            for (id, terms) in order {
                builder.add_document(*id, terms.iter().copied()).unwrap();
            }
            builder.finish(&paths(tmp)).unwrap().paths
        };

        let ascending: Vec<_> = docs.iter().collect();
        let mut shuffled: Vec<_> = docs.iter().rev().collect();
        // interleave ends so blocks hold ids from both halves
        shuffled.swap(0, 15);
        shuffled.swap(3, 22);
        shuffled.swap(8, 29);

        let tmp_a = TempDir::new().unwrap();
        let tmp_b = TempDir::new().unwrap();
        let a = IndexHandle::open(&build(&tmp_a, &ascending)).unwrap();
        let b = IndexHandle::open(&build(&tmp_b, &shuffled)).unwrap();
        a.verify().unwrap();
        b.verify().unwrap();

        assert_eq!(a.universe().as_slice(), b.universe().as_slice());
        for word in words {
            let expected: Vec<DocId> = docs
                .iter()
                .filter(|(_, terms)| terms.contains(&word))
                .map(|(id, _)| *id)
                .collect();
            assert_eq!(a.posting_list(word).unwrap().as_slice(), expected.as_slice(), "{}", word);
            assert_eq!(b.posting_list(word).unwrap().as_slice(), expected.as_slice(), "{}", word);
            assert_eq!(a.frequency(word), b.frequency(word));
        }
    }

    #[test]
    fn test_invalid_term_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut builder = IndexBuilder::new(config(&tmp, 10)).unwrap();
        let result = builder.add_document(1, ["fine", "not fine"]);
        assert!(matches!(result, Err(IndexError::InvalidTerm(_))));
        assert_eq!(builder.document_count(), 0);
    }

    #[test]
    fn test_index_directory_skips_bad_entries() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("10"), "The cats were running.").unwrap();
        fs::write(docs.join("2"), "A dog ran").unwrap();
        fs::write(docs.join("notes.txt"), "ignored").unwrap();
        fs::create_dir(docs.join("7")).unwrap();

        let mut builder = IndexBuilder::new(config(&tmp, 3)).unwrap();
        let indexed = builder
            .index_directory(&docs, &crate::tokenizer::Tokenizer::default())
            .unwrap();
        assert_eq!(indexed, 2);

        let summary = builder.finish(&paths(&tmp)).unwrap();
        let index = IndexHandle::open(&summary.paths).unwrap();
        assert_eq!(index.universe().as_slice(), &[2, 10]);
        assert_eq!(index.posting_list("cat").unwrap().as_slice(), &[10]);
        assert_eq!(index.posting_list("dog").unwrap().as_slice(), &[2]);
    }
}
