use anyhow::{Context, Result};
use blockdex::{IndexHandle, IndexPaths, QueryRunner, TokenizerConfig, Tokenizer};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Answer a file of Boolean queries against a built index", long_about = None)]
struct Args {
    /// Dictionary file
    #[arg(short = 'd', long, env = "BLOCKDEX_DICTIONARY")]
    dictionary: PathBuf,

    /// Postings file
    #[arg(short = 'p', long, env = "BLOCKDEX_POSTINGS")]
    postings: PathBuf,

    /// Queries, one per line
    #[arg(short = 'q', long, env = "BLOCKDEX_QUERIES")]
    queries: PathBuf,

    /// Results, one line of ascending document ids per query
    #[arg(short = 'o', long, env = "BLOCKDEX_RESULTS")]
    output: PathBuf,

    /// All-document-ids file (default: all-ids.txt beside the dictionary)
    #[arg(long, env = "BLOCKDEX_DOC_IDS")]
    doc_ids: Option<PathBuf>,

    /// Index was built with stopwords removed
    #[arg(long, env = "BLOCKDEX_REMOVE_STOPWORDS")]
    remove_stopwords: bool,

    /// Index was built without stemming
    #[arg(long, env = "BLOCKDEX_NO_STEM")]
    no_stem: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut paths = IndexPaths::new(&args.dictionary, &args.postings);
    if let Some(doc_ids) = &args.doc_ids {
        paths = paths.with_doc_ids(doc_ids);
    }

    let tokenizer = Tokenizer::new(&TokenizerConfig {
        remove_stopwords: args.remove_stopwords,
        stem: !args.no_stem,
        ..TokenizerConfig::default()
    });

    let index = IndexHandle::open(&paths).context("Failed to open index")?;
    info!(terms = index.dictionary().len(), documents = index.universe().len(), "Index loaded");

    let summary = QueryRunner::new(&index, &tokenizer)
        .run_file(&args.queries, &args.output)
        .with_context(|| format!("Failed to answer {}", args.queries.display()))?;

    info!(
        queries = summary.queries,
        rejected = summary.rejected,
        "Results written to {}",
        args.output.display()
    );
    Ok(())
}
