//! Read side of a finished index
//!
//! An [`IndexHandle`] owns everything a query run needs: the dictionary in
//! memory, the postings file opened for random access and the document
//! universe used for negation. It is passed by reference to the evaluator.

use tracing::debug;

use super::postings::PostingList;
use super::store::{read_doc_ids, DictionaryFile, PostingsReader};
use super::term_dict::TermDictionary;
use crate::config::IndexPaths;
use crate::error::{IndexError, Result};

pub struct IndexHandle {
    dictionary: TermDictionary,
    postings: PostingsReader,
    universe: PostingList,
}

impl IndexHandle {
    /// Load the dictionary and universe and open the postings file.
    ///
    /// The postings checksum recorded in the dictionary must match.
    pub fn open(paths: &IndexPaths) -> Result<Self> {
        let file = DictionaryFile::read(&paths.dictionary)?;
        let postings = PostingsReader::open_verified(&paths.postings, file.postings_checksum)?;
        let universe = read_doc_ids(&paths.doc_ids)?;

        debug!(
            terms = file.dictionary.len(),
            documents = universe.len(),
            "index opened"
        );
        Ok(Self {
            dictionary: file.dictionary,
            postings,
            universe,
        })
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    /// All indexed document ids, skips built
    pub fn universe(&self) -> &PostingList {
        &self.universe
    }

    pub fn frequency(&self, term: &str) -> Option<u32> {
        self.dictionary.frequency(term)
    }

    /// Posting list of `term` with skips built; empty if the term is unknown
    pub fn posting_list(&self, term: &str) -> Result<PostingList> {
        if !self.dictionary.contains(term) {
            return Ok(PostingList::new());
        }
        let pointer = self.dictionary.pointer(term)?;
        self.postings.read_list(pointer, term)
    }

    /// Check the index for internal consistency.
    ///
    /// Every entry must point at a record for the same term whose length
    /// equals the stored frequency, records must appear in term order, and
    /// every posted id must belong to the universe.
    pub fn verify(&self) -> Result<()> {
        let path = self.postings.path();
        let records = self.postings.records()?;
        if records.len() != self.dictionary.len() {
            return Err(IndexError::corrupt(
                path,
                format!(
                    "{} records for {} dictionary terms",
                    records.len(),
                    self.dictionary.len()
                ),
            ));
        }
        if records.windows(2).any(|w| w[0].1 >= w[1].1) {
            return Err(IndexError::corrupt(path, "records are not in term order"));
        }

        for (term, entry) in &self.dictionary {
            let pointer = entry
                .pointer
                .ok_or_else(|| IndexError::PointerUnset(term.clone()))?;
            // read_list checks the term at `pointer` and strict ascent
            let list = self.postings.read_list(pointer, term)?;
            if list.len() as u32 != entry.doc_frequency {
                return Err(IndexError::corrupt(
                    path,
                    format!(
                        "frequency of {:?} is {}, postings hold {}",
                        term,
                        entry.doc_frequency,
                        list.len()
                    ),
                ));
            }
            let stray = list.iter().find(|d| !self.universe.contains(*d));
            if let Some(doc_id) = stray {
                return Err(IndexError::NotInUniverse(doc_id));
            }
        }
        debug!(terms = self.dictionary.len(), "index verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::builder::IndexBuilder;
    use crate::config::IndexerConfig;
    use std::fs;
    use tempfile::TempDir;

    fn build(tmp: &TempDir) -> IndexPaths {
        let mut builder =
            IndexBuilder::new(IndexerConfig::new(tmp.path().join("work")).with_block_size(3)).unwrap();
        builder.add_document(1, ["cat", "dog"]).unwrap();
        builder.add_document(2, ["dog", "bird"]).unwrap();
        builder.add_document(3, ["cat", "bird"]).unwrap();
        let paths = IndexPaths::new(tmp.path().join("dictionary"), tmp.path().join("postings"));
        builder.finish(&paths).unwrap().paths
    }

    #[test]
    fn test_open_and_lookup() {
        let tmp = TempDir::new().unwrap();
        let paths = build(&tmp);
        assert_eq!(paths.doc_ids, tmp.path().join("all-ids.txt"));

        let index = IndexHandle::open(&paths).unwrap();
        assert_eq!(index.frequency("bird"), Some(2));
        assert_eq!(index.frequency("eel"), None);
        assert_eq!(index.posting_list("bird").unwrap().as_slice(), &[2, 3]);
        assert!(index.posting_list("eel").unwrap().is_empty());
        assert!(index.universe().has_skips());
        index.verify().unwrap();
    }

    #[test]
    fn test_tampered_postings_rejected() {
        let tmp = TempDir::new().unwrap();
        let paths = build(&tmp);

        let content = fs::read_to_string(&paths.postings).unwrap();
        fs::write(&paths.postings, content.replace("bird 2 3", "bird 2 9")).unwrap();
        assert!(matches!(
            IndexHandle::open(&paths),
            Err(IndexError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_universe_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let paths = build(&tmp);
        fs::remove_file(&paths.doc_ids).unwrap();
        assert!(matches!(
            IndexHandle::open(&paths),
            Err(IndexError::MissingBlock(_))
        ));
    }

    #[test]
    fn test_verify_detects_ids_outside_universe() {
        let tmp = TempDir::new().unwrap();
        let paths = build(&tmp);
        fs::write(&paths.doc_ids, "1 2\n").unwrap();

        let index = IndexHandle::open(&paths).unwrap();
        assert!(matches!(index.verify(), Err(IndexError::NotInUniverse(3))));
    }
}
