//! Pairwise block merging
//!
//! Blocks are merged as a binary tournament: each round pairs adjacent
//! blocks in order, merges every pair into a block with a fresh sequence
//! number and appends the results to the next round. An unpaired trailing
//! block is carried over unchanged. Rounds repeat until one block remains.
//!
//! Merges within a round only read their two inputs and write their own
//! output, so they may run on separate worker threads.

use crossbeam::channel;
use tracing::{debug, info, warn};

use super::block::Block;
use super::postings::union;
use super::store::{BlockStore, DictionaryFile, PostingsWriter};
use super::term_dict::TermDictionary;
use super::types::{BlockId, BlockIdAllocator};
use crate::error::{IndexError, Result};

/// Merge two finalized blocks into a new block `id`.
///
/// Terms unique to one side are copied verbatim; shared terms are unioned
/// and get freshly built skips.
pub fn merge_two_blocks(store: &BlockStore, left: &Block, right: &Block, id: BlockId) -> Result<Block> {
    let left = left.open()?;
    let right = right.open()?;
    let mut dictionary = TermDictionary::merged(left.dictionary(), right.dictionary());

    let mut writer = PostingsWriter::create(store.postings_path(id))?;
    let terms: Vec<String> = dictionary.terms().map(str::to_string).collect();

    for term in &terms {
        let in_left = left.dictionary().contains(term);
        let in_right = right.dictionary().contains(term);

        let pointer = if in_left && in_right {
            let mut merged = union(&left.read_list(term)?, &right.read_list(term)?);
            merged.build_skip();

            let summed = dictionary.frequency(term).unwrap_or(0);
            if merged.len() as u32 != summed {
                // The same document reached both blocks for this term.
                warn!(
                    term = %term,
                    summed,
                    actual = merged.len(),
                    "overlapping postings across blocks, using union length"
                );
                dictionary.set_frequency(term, merged.len() as u32)?;
            }
            writer.write_list(term, &mut merged)?
        } else {
            let source = if in_left { &left } else { &right };
            let (doc_ids, skips) = source.read_raw(term)?;
            writer.write_raw(term, &doc_ids, &skips)?
        };
        dictionary.set_pointer(term, pointer)?;
    }

    let checksum = writer.finish()?;
    let term_count = dictionary.len();
    DictionaryFile::new(dictionary, checksum).write(&store.dictionary_path(id))?;

    debug!(
        left = %left.block().id,
        right = %right.block().id,
        merged = %id,
        terms = term_count,
        "blocks merged"
    );
    Ok(Block::new(store, id, term_count))
}

/// Runs merge rounds over a list of blocks until one remains
pub struct BlockMerger<'a> {
    store: &'a BlockStore,
    workers: usize,
    keep_intermediate: bool,
}

/// A pairwise merge scheduled within a round
struct MergeJob {
    slot: usize,
    left: Block,
    right: Block,
    id: BlockId,
}

impl<'a> BlockMerger<'a> {
    pub fn new(store: &'a BlockStore) -> Self {
        Self {
            store,
            workers: 1,
            keep_intermediate: false,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    /// Merge `blocks` (in creation order) into a single block.
    ///
    /// Sequence numbers for merged blocks come from `ids`. Returns the final
    /// block and the number of pairwise merges performed.
    pub fn merge_all(&self, blocks: Vec<Block>, ids: &mut BlockIdAllocator) -> Result<(Block, usize)> {
        if blocks.is_empty() {
            return Err(IndexError::NoBlocks);
        }

        let mut working = blocks;
        let mut round = 0;
        let mut merges = 0;

        while working.len() > 1 {
            round += 1;
            let mut jobs = Vec::with_capacity(working.len() / 2);
            let mut carry = None;
            let mut pending = working.into_iter();
            while let Some(left) = pending.next() {
                match pending.next() {
                    Some(right) => jobs.push(MergeJob {
                        slot: jobs.len(),
                        left,
                        right,
                        id: ids.allocate(),
                    }),
                    None => carry = Some(left),
                }
            }

            info!(
                round,
                merges = jobs.len(),
                carried = carry.is_some(),
                "merge round started"
            );
            merges += jobs.len();

            let mut next = self.run_round(jobs)?;
            next.extend(carry);
            working = next;
        }

        let block = working.pop().ok_or(IndexError::NoBlocks)?;
        Ok((block, merges))
    }

    fn run_round(&self, jobs: Vec<MergeJob>) -> Result<Vec<Block>> {
        if self.workers <= 1 || jobs.len() <= 1 {
            return jobs.into_iter().map(|job| self.run_job(&job)).collect();
        }

        let job_count = jobs.len();
        let (job_tx, job_rx) = channel::unbounded::<MergeJob>();
        let (result_tx, result_rx) = channel::unbounded::<(usize, Result<Block>)>();
        for job in jobs {
            job_tx
                .send(job)
                .map_err(|e| IndexError::MergeWorker(format!("job queue closed for {}", e.0.id)))?;
        }
        drop(job_tx);

        std::thread::scope(|scope| {
            for _ in 0..self.workers.min(job_count) {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        let result = self.run_job(&job);
                        if result_tx.send((job.slot, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<Block>> = vec![None; job_count];
        for (slot, result) in result_rx.iter() {
            slots[slot] = Some(result?);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(slot, b)| {
                b.ok_or_else(|| IndexError::MergeWorker(format!("no result for merge {}", slot)))
            })
            .collect()
    }

    fn run_job(&self, job: &MergeJob) -> Result<Block> {
        let merged = merge_two_blocks(self.store, &job.left, &job.right, job.id)?;
        if !self.keep_intermediate {
            job.left.remove()?;
            job.right.remove()?;
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::TermDocPair;
    use crate::index::writer::BlockWriter;
    use std::fs;
    use tempfile::TempDir;

    fn write_block(store: &BlockStore, ids: &mut BlockIdAllocator, raw: &[(&str, u32)]) -> Block {
        let pairs = raw.iter().map(|&(t, d)| TermDocPair::new(t, d)).collect();
        BlockWriter::new(ids.allocate()).write_pairs(store, pairs).unwrap()
    }

    #[test]
    fn test_merge_two_blocks() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();
        let mut ids = BlockIdAllocator::new();

        let a = write_block(&store, &mut ids, &[("cat", 1), ("dog", 1), ("dog", 2)]);
        let b = write_block(&store, &mut ids, &[("bird", 3), ("cat", 3), ("dog", 4)]);

        let merged = merge_two_blocks(&store, &a, &b, ids.allocate()).unwrap();
        assert_eq!(merged.id, BlockId::new(2));

        let content = fs::read_to_string(&merged.postings_path).unwrap();
        assert_eq!(content, "bird 3\n\ncat 1 3\n1\ndog 1 2 4\n1 2\n");

        let reader = merged.open().unwrap();
        let dict = reader.dictionary();
        assert_eq!(dict.frequency("bird"), Some(1));
        assert_eq!(dict.frequency("cat"), Some(2));
        assert_eq!(dict.frequency("dog"), Some(3));
        assert_eq!(dict.pointer("bird").unwrap(), 1);
        assert_eq!(dict.pointer("cat").unwrap(), 3);
        assert_eq!(dict.pointer("dog").unwrap(), 5);
        assert_eq!(reader.read_list("dog").unwrap().as_slice(), &[1, 2, 4]);

        // inputs are left alone by a single merge
        assert!(a.dictionary_path.exists());
    }

    #[test]
    fn test_overlapping_postings_use_union_length() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();
        let mut ids = BlockIdAllocator::new();

        let a = write_block(&store, &mut ids, &[("cat", 1), ("cat", 2)]);
        let b = write_block(&store, &mut ids, &[("cat", 2), ("cat", 3)]);

        let merged = merge_two_blocks(&store, &a, &b, ids.allocate()).unwrap();
        let reader = merged.open().unwrap();
        assert_eq!(reader.dictionary().frequency("cat"), Some(3));
        assert_eq!(reader.read_list("cat").unwrap().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_missing_block_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();
        let mut ids = BlockIdAllocator::new();

        let a = write_block(&store, &mut ids, &[("cat", 1)]);
        let b = write_block(&store, &mut ids, &[("dog", 2)]);
        fs::remove_file(&b.postings_path).unwrap();

        let result = merge_two_blocks(&store, &a, &b, ids.allocate());
        assert!(matches!(result, Err(IndexError::MissingBlock(_))));
    }

    #[test]
    fn test_odd_block_count_carries_unpaired_block() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();
        let mut ids = BlockIdAllocator::new();

        let blocks = vec![
            write_block(&store, &mut ids, &[("cat", 1)]),
            write_block(&store, &mut ids, &[("dog", 2)]),
            write_block(&store, &mut ids, &[("eel", 3)]),
        ];

        let (final_block, merges) = BlockMerger::new(&store).merge_all(blocks, &mut ids).unwrap();

        // round 1: (0, 1) -> 3, 2 carried; round 2: (3, 2) -> 4
        assert_eq!(merges, 2);
        assert_eq!(final_block.id, BlockId::new(4));
        let reader = final_block.open().unwrap();
        let terms: Vec<_> = reader.dictionary().terms().collect();
        assert_eq!(terms, vec!["cat", "dog", "eel"]);
        assert_eq!(reader.read_list("eel").unwrap().as_slice(), &[3]);

        // merged-away blocks are cleaned up
        for id in 0..4 {
            assert!(!store.dictionary_path(BlockId::new(id)).exists());
        }
    }

    #[test]
    fn test_single_block_needs_no_merge() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::new(tmp.path()).unwrap();
        let mut ids = BlockIdAllocator::new();
        let block = write_block(&store, &mut ids, &[("cat", 1)]);

        let (final_block, merges) = BlockMerger::new(&store)
            .merge_all(vec![block.clone()], &mut ids)
            .unwrap();
        assert_eq!(merges, 0);
        assert_eq!(final_block, block);
    }

    #[test]
    fn test_parallel_merge_matches_sequential() {
        let raw: Vec<Vec<(String, u32)>> = (0..7u32)
            .map(|b| {
                (0..20u32)
                    .map(|i| (format!("t{}", (i * 7 + b) % 11), b * 100 + i))
                    .collect()
            })
            .collect();

        let mut outputs = Vec::new();
        for workers in [1, 4] {
            let tmp = TempDir::new().unwrap();
            let store = BlockStore::new(tmp.path()).unwrap();
            let mut ids = BlockIdAllocator::new();
            let blocks: Vec<_> = raw
                .iter()
                .map(|pairs| {
                    let pairs = pairs
                        .iter()
                        .map(|(t, d)| TermDocPair::new(t.clone(), *d))
                        .collect();
                    BlockWriter::new(ids.allocate()).write_pairs(&store, pairs).unwrap()
                })
                .collect();

            let (final_block, merges) = BlockMerger::new(&store)
                .with_workers(workers)
                .merge_all(blocks, &mut ids)
                .unwrap();
            assert_eq!(merges, 6);
            outputs.push((
                final_block.id,
                fs::read_to_string(&final_block.postings_path).unwrap(),
            ));
        }
        assert_eq!(outputs[0], outputs[1]);
    }
}
