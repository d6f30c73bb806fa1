//! Batch query execution: one query per input line, one result line per query

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use super::evaluator::Evaluator;
use super::parser::Query;
use crate::error::Result;
use crate::index::store::tmp_path;
use crate::index::{IndexHandle, PostingList};
use crate::tokenizer::TextNormalizer;

/// Counts from one run over a queries file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub queries: usize,
    /// Queries rejected as malformed or empty
    pub rejected: usize,
}

pub struct QueryRunner<'a, N: TextNormalizer + ?Sized> {
    index: &'a IndexHandle,
    normalizer: &'a N,
}

impl<'a, N: TextNormalizer + ?Sized> QueryRunner<'a, N> {
    pub fn new(index: &'a IndexHandle, normalizer: &'a N) -> Self {
        Self { index, normalizer }
    }

    /// Parse and evaluate a single query line
    pub fn run_query(&self, line: &str) -> Result<PostingList> {
        let query = Query::parse(line.trim(), self.normalizer)?;
        Evaluator::new(self.index).evaluate(&query)
    }

    /// Answer every line of `queries`, writing results to `results`.
    ///
    /// A rejected query yields an empty line so output lines stay aligned
    /// with input lines. Storage errors abort the run and leave any earlier
    /// results file untouched.
    pub fn run_file(&self, queries: &Path, results: &Path) -> Result<RunSummary> {
        let input = BufReader::new(File::open(queries)?);
        let tmp = tmp_path(results);
        let mut out = BufWriter::new(File::create(&tmp)?);
        let mut summary = RunSummary::default();

        let outcome = self.answer_all(input, &mut out, &mut summary);
        if let Err(e) = outcome {
            drop(out);
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, results)?;

        info!(
            queries = summary.queries,
            rejected = summary.rejected,
            results = %results.display(),
            "queries answered"
        );
        Ok(summary)
    }

    fn answer_all<R: BufRead, W: Write>(
        &self,
        input: R,
        out: &mut W,
        summary: &mut RunSummary,
    ) -> Result<()> {
        for (line_no, line) in input.lines().enumerate() {
            let line = line?;
            summary.queries += 1;
            let result = match self.run_query(&line) {
                Ok(list) => list.to_string(),
                Err(e) if e.is_query_error() => {
                    warn!(line = line_no + 1, query = %line.trim(), error = %e, "query rejected");
                    summary.rejected += 1;
                    String::new()
                }
                Err(e) => return Err(e),
            };
            writeln!(out, "{}", result)?;
        }
        Ok(())
    }
}
