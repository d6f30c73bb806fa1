//! On-disk formats for blocks and finished indexes
//!
//! Postings file (text, one record per term, terms ascending):
//!
//! ```text
//! <term> <doc-id> <doc-id> ...     <- line `pointer` (1-indexed)
//! <skip> <skip> ...                <- line `pointer + 1`
//! ```
//!
//! Dictionary file: bincode of [`DictionaryFile`], which carries a CRC32 of
//! the postings file so a truncated or half-written block is rejected.
//!
//! Every file is written to a `.tmp` sibling, synced and renamed into place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::postings::PostingList;
use super::term_dict::TermDictionary;
use super::types::{is_valid_term, BlockId, DocId};
use crate::error::{IndexError, Result};

/// Serialized dictionary file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DictionaryFile {
    pub version: u32,
    /// CRC32 of the companion postings file
    pub postings_checksum: u32,
    pub dictionary: TermDictionary,
}

impl DictionaryFile {
    /// Current dictionary format version
    pub const VERSION: u32 = 1;

    pub fn new(dictionary: TermDictionary, postings_checksum: u32) -> Self {
        Self {
            version: Self::VERSION,
            postings_checksum,
            dictionary,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        write_atomic(path, &bytes)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| not_found_as_missing(e, path))?;
        let file: DictionaryFile = bincode::deserialize(&bytes)?;
        if file.version != Self::VERSION {
            return Err(IndexError::IncompatibleDictionary {
                expected: Self::VERSION,
                actual: file.version,
            });
        }
        Ok(file)
    }
}

/// Sibling path used while a file is being written
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("unnamed"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path` via a synced temporary file and a rename
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// A file moved next to its destination, not yet visible under its final name
#[derive(Debug)]
pub struct StagedFile {
    source: PathBuf,
    staged: PathBuf,
    dest: PathBuf,
    /// Whether `source` was renamed away (otherwise it was copied)
    renamed: bool,
}

/// Stage `from` as the `.tmp` sibling of `to`.
///
/// Renames when possible; otherwise copies and syncs, leaving `from` in
/// place until [`StagedFile::commit`].
pub fn stage_file(from: &Path, to: &Path) -> Result<StagedFile> {
    if !from.is_file() {
        return Err(IndexError::MissingBlock(from.to_path_buf()));
    }
    let staged = tmp_path(to);
    let renamed = fs::rename(from, &staged).is_ok();
    if !renamed {
        if let Err(e) = fs::copy(from, &staged).and_then(|_| File::open(&staged)?.sync_all()) {
            // a partial copy must not linger beside the destination
            if staged.exists() {
                fs::remove_file(&staged)?;
            }
            return Err(IndexError::Io(e));
        }
    }
    Ok(StagedFile {
        source: from.to_path_buf(),
        staged,
        dest: to.to_path_buf(),
        renamed,
    })
}

impl StagedFile {
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Rename the staged file onto its destination
    pub fn commit(self) -> Result<()> {
        fs::rename(&self.staged, &self.dest)?;
        if !self.renamed {
            fs::remove_file(&self.source)?;
        }
        Ok(())
    }

    /// Undo the staging: the source is restored and nothing is left beside the destination
    pub fn rollback(self) -> Result<()> {
        if self.renamed {
            fs::rename(&self.staged, &self.source)?;
        } else {
            fs::remove_file(&self.staged)?;
        }
        Ok(())
    }
}

fn not_found_as_missing(err: io::Error, path: &Path) -> IndexError {
    if err.kind() == io::ErrorKind::NotFound {
        IndexError::MissingBlock(path.to_path_buf())
    } else {
        IndexError::Io(err)
    }
}

/// Write the all-document-ids file: one line of ascending ids
pub fn write_doc_ids(path: &Path, doc_ids: &PostingList) -> Result<()> {
    write_atomic(path, format!("{}\n", doc_ids).as_bytes())
}

pub fn read_doc_ids(path: &Path) -> Result<PostingList> {
    let content = fs::read_to_string(path).map_err(|e| not_found_as_missing(e, path))?;
    let line = content.lines().next().unwrap_or("");
    let ids = parse_ids(line, path)?;
    let mut list: PostingList = ids.into_iter().collect();
    list.build_skip();
    Ok(list)
}

fn parse_ids(field: &str, path: &Path) -> Result<Vec<DocId>> {
    field
        .split_whitespace()
        .map(|id| {
            id.parse::<DocId>()
                .map_err(|_| IndexError::corrupt(path, format!("invalid document id {:?}", id)))
        })
        .collect()
}

/// Sequential writer of postings records
pub struct PostingsWriter {
    path: PathBuf,
    tmp: PathBuf,
    out: BufWriter<File>,
    hasher: Hasher,
    /// Lines written so far
    lines: u64,
}

impl PostingsWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tmp = tmp_path(&path);
        let out = BufWriter::new(File::create(&tmp)?);
        Ok(Self {
            path,
            tmp,
            out,
            hasher: Hasher::new(),
            lines: 0,
        })
    }

    /// Write a record for `term`, building skips first if they are stale.
    ///
    /// Returns the pointer (1-indexed line) of the record.
    pub fn write_list(&mut self, term: &str, list: &mut PostingList) -> Result<u64> {
        if !list.has_skips() {
            list.build_skip();
        }
        self.write_raw(term, &list.to_string(), &list.skip_line())
    }

    /// Write a record from already formatted doc-id and skip lines
    pub fn write_raw(&mut self, term: &str, doc_ids: &str, skips: &str) -> Result<u64> {
        if !is_valid_term(term) {
            return Err(IndexError::InvalidTerm(term.to_string()));
        }
        let pointer = self.lines + 1;
        let record = format!("{} {}\n{}\n", term, doc_ids, skips);
        self.hasher.update(record.as_bytes());
        self.out.write_all(record.as_bytes())?;
        self.lines += 2;
        Ok(pointer)
    }

    pub fn records(&self) -> u64 {
        self.lines / 2
    }

    /// Flush, sync and move the file into place. Returns its checksum.
    pub fn finish(self) -> Result<u32> {
        let file = self.out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.tmp, &self.path)?;
        Ok(self.hasher.finalize())
    }
}

/// Random-access reader of postings records by pointer
pub struct PostingsReader {
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// Byte offset of each line start
    line_offsets: Vec<u64>,
    checksum: u32,
}

impl PostingsReader {
    /// Open a postings file, indexing line starts and computing its checksum
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path).map_err(|e| not_found_as_missing(e, &path))?;
        let mut reader = BufReader::new(file);

        let mut hasher = Hasher::new();
        let mut line_offsets = Vec::new();
        let mut offset = 0u64;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            line_offsets.push(offset);
            hasher.update(&buf);
            offset += n as u64;
        }

        Ok(Self {
            path,
            file: Mutex::new(reader),
            line_offsets,
            checksum: hasher.finalize(),
        })
    }

    /// Open and check the file against the checksum recorded in its dictionary
    pub fn open_verified(path: impl Into<PathBuf>, expected: u32) -> Result<Self> {
        let reader = Self::open(path)?;
        if reader.checksum != expected {
            return Err(IndexError::ChecksumMismatch {
                path: reader.path.clone(),
                expected,
                actual: reader.checksum,
            });
        }
        Ok(reader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    /// Read 1-indexed line `line_no` without its newline
    pub fn read_line(&self, line_no: u64) -> Result<String> {
        let offset = line_no
            .checked_sub(1)
            .and_then(|idx| self.line_offsets.get(idx as usize))
            .copied()
            .ok_or_else(|| {
                IndexError::corrupt(&self.path, format!("line {} out of range", line_no))
            })?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut line = String::new();
        file.read_line(&mut line)?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Raw doc-id field and skip line of the record at `pointer`, checked against `term`
    pub fn read_raw(&self, pointer: u64, term: &str) -> Result<(String, String)> {
        let line = self.read_line(pointer)?;
        let (found, doc_ids) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        if found != term {
            return Err(IndexError::corrupt(
                &self.path,
                format!("expected term {:?} at line {}, found {:?}", term, pointer, found),
            ));
        }
        let doc_ids = doc_ids.to_string();
        let skips = self.read_line(pointer + 1)?;
        Ok((doc_ids, skips))
    }

    /// Posting list of the record at `pointer`, with skips rebuilt.
    ///
    /// The stored skip line is not trusted; skips are recomputed from the ids.
    pub fn read_list(&self, pointer: u64, term: &str) -> Result<PostingList> {
        let (doc_ids, _) = self.read_raw(pointer, term)?;
        let ids = parse_ids(&doc_ids, &self.path)?;
        if ids.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::corrupt(
                &self.path,
                format!("postings for {:?} are not strictly ascending", term),
            ));
        }
        let mut list: PostingList = ids.into_iter().collect();
        list.build_skip();
        Ok(list)
    }

    /// Every record as (pointer, term) in file order
    pub fn records(&self) -> Result<Vec<(u64, String)>> {
        let mut out = Vec::with_capacity(self.line_offsets.len() / 2);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        for (idx, line) in content.lines().enumerate().step_by(2) {
            let term = line.split(' ').next().unwrap_or("");
            out.push((idx as u64 + 1, term.to_string()));
        }
        Ok(out)
    }
}

/// Directory of intermediate block files
pub struct BlockStore {
    base_dir: PathBuf,
}

impl BlockStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn dictionary_path(&self, id: BlockId) -> PathBuf {
        self.base_dir.join(format!("{}.dict", id.0))
    }

    pub fn postings_path(&self, id: BlockId) -> PathBuf {
        self.base_dir.join(format!("{}.posting", id.0))
    }

    /// Remove the work directory if nothing is left in it
    pub fn remove_if_empty(&self) -> Result<()> {
        let empty = fs::read_dir(&self.base_dir)?.next().is_none();
        if empty {
            fs::remove_dir(&self.base_dir)?;
        }
        Ok(())
    }
}
