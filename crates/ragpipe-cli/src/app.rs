//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use ragpipe_core::AggregationMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ragpipe")]
#[command(
    author,
    version,
    about = "Chunk, index and question a small document corpus"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "RAGPIPE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split files into chunks and print them (no network)
    Chunk(ChunkArgs),

    /// Chunk, embed and save files as a snapshot
    Index(IndexArgs),

    /// Retrieve the best-matching chunks for a query
    Search(SearchArgs),

    /// Answer a question: decompose, retrieve, answer, aggregate
    Ask(AskArgs),
}

#[derive(Args)]
pub struct ChunkArgs {
    /// Text or PDF files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Sentences per chunk
    #[arg(long, conflicts_with_all = ["chars", "overlap", "separator"])]
    pub sentences: Option<usize>,

    /// Maximum characters per chunk
    #[arg(long)]
    pub chars: Option<usize>,

    /// Characters repeated from the previous chunk
    #[arg(long, requires = "chars")]
    pub overlap: Option<usize>,

    /// Separator the text is split on
    #[arg(long, requires = "chars")]
    pub separator: Option<String>,
}

#[derive(Args)]
pub struct IndexArgs {
    /// Text or PDF files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Snapshot database to write
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Texts per embedding request
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Snapshot database to read
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Number of chunks to return
    #[arg(short = 'k', long = "top-k")]
    pub k: Option<usize>,
}

#[derive(Args)]
pub struct AskArgs {
    /// Question to answer
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Snapshot database to read
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Chunks retrieved per sub-question
    #[arg(short = 'k', long = "top-k")]
    pub k: Option<usize>,

    /// How partial answers are combined
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Answer the question as is, without decomposing it
    #[arg(long)]
    pub no_plan: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Sections,
    Synthesized,
}

impl From<ModeArg> for AggregationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sections => AggregationMode::Sections,
            ModeArg::Synthesized => AggregationMode::Synthesized,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Cli,
    Json,
    Md,
}
