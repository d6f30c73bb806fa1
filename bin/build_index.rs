use anyhow::{Context, Result};
use blockdex::{IndexBuilder, IndexHandle, IndexPaths, IndexerConfig, TokenizerConfig, Tokenizer};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "build-index")]
#[command(about = "Build a block-merged inverted index from a directory of documents", long_about = None)]
struct Args {
    /// Directory of documents, one file per document named by its numeric id
    #[arg(short = 'i', long, env = "BLOCKDEX_INPUT_DIR")]
    input_dir: PathBuf,

    /// Output dictionary file
    #[arg(short = 'd', long, env = "BLOCKDEX_DICTIONARY")]
    dictionary: PathBuf,

    /// Output postings file
    #[arg(short = 'p', long, env = "BLOCKDEX_POSTINGS")]
    postings: PathBuf,

    /// Output all-document-ids file (default: all-ids.txt beside the dictionary)
    #[arg(long, env = "BLOCKDEX_DOC_IDS")]
    doc_ids: Option<PathBuf>,

    /// Maximum (term, doc-id) pairs held in memory per block
    #[arg(long, env = "BLOCKDEX_BLOCK_SIZE", default_value_t = blockdex::config::DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Directory for intermediate blocks
    #[arg(long, env = "BLOCKDEX_WORK_DIR", default_value = "tmp")]
    work_dir: PathBuf,

    /// Pairwise merges run concurrently within a merge round
    #[arg(long, env = "BLOCKDEX_MERGE_WORKERS", default_value_t = 1)]
    merge_workers: usize,

    /// Keep merged-away blocks in the work directory
    #[arg(long, env = "BLOCKDEX_KEEP_INTERMEDIATE")]
    keep_intermediate: bool,

    /// Drop English stopwords
    #[arg(long, env = "BLOCKDEX_REMOVE_STOPWORDS")]
    remove_stopwords: bool,

    /// Disable stemming
    #[arg(long, env = "BLOCKDEX_NO_STEM")]
    no_stem: bool,

    /// Re-open the finished index and check its consistency
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("build-index v{}", blockdex::VERSION);

    let tokenizer_config = TokenizerConfig {
        remove_stopwords: args.remove_stopwords,
        stem: !args.no_stem,
        ..TokenizerConfig::default()
    };
    let config = IndexerConfig::new(&args.work_dir)
        .with_block_size(args.block_size)
        .with_merge_workers(args.merge_workers)
        .with_keep_intermediate(args.keep_intermediate)
        .with_tokenizer(tokenizer_config);
    let tokenizer = Tokenizer::new(&config.tokenizer_config);

    let mut paths = IndexPaths::new(&args.dictionary, &args.postings);
    if let Some(doc_ids) = &args.doc_ids {
        paths = paths.with_doc_ids(doc_ids);
    }

    let mut builder = IndexBuilder::new(config).context("Failed to prepare work directory")?;
    builder
        .index_directory(&args.input_dir, &tokenizer)
        .with_context(|| format!("Failed to index {}", args.input_dir.display()))?;
    let summary = builder.finish(&paths).context("Failed to build index")?;

    info!(
        documents = summary.documents,
        terms = summary.terms,
        blocks = summary.blocks_written,
        merges = summary.merges,
        "Index built"
    );

    if args.verify {
        IndexHandle::open(&paths)
            .and_then(|index| index.verify())
            .context("Index verification failed")?;
        info!("Index verified");
    }

    println!("dictionary: {}", paths.dictionary.display());
    println!("postings:   {}", paths.postings.display());
    println!("doc ids:    {}", paths.doc_ids.display());
    Ok(())
}
