use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "nutrirag",
    about = "Hybrid semantic + keyword retrieval over a nutrition evidence base"
)]
pub struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query the knowledge base and print the most relevant items
    Search(SearchArgs),
    /// Split a text file into overlapping chunks
    Chunk(ChunkArgs),
    /// Extract salient keywords from text
    Keywords(KeywordsArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return
    #[arg(short = 'n', long, default_value = "3")]
    pub count: usize,

    /// Seed records file (JSON); defaults to the built-in evidence pack
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Ingest a plain-text document before searching (repeatable)
    #[arg(long, value_name = "FILE")]
    pub ingest: Vec<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the prompt context block instead of a result list
    #[arg(long)]
    pub show_context: bool,

    /// Embeddings endpoint base URL (defaults to the OpenAI API)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Embedding model name
    #[arg(long)]
    pub model: Option<String>,

    /// API key; falls back to NUTRIRAG_API_KEY, then OPENAI_API_KEY
    #[arg(long)]
    pub api_key: Option<String>,
}

// -- Chunk --

#[derive(Debug, Parser)]
pub struct ChunkArgs {
    /// File containing the text to split
    pub file: PathBuf,

    /// Target chunk size in characters
    #[arg(long, default_value = "2000")]
    pub chunk_size: usize,

    /// Overlap carried between neighboring chunks, in characters
    #[arg(long, default_value = "300")]
    pub overlap: usize,

    /// Output as a JSON array
    #[arg(long)]
    pub json: bool,
}

// -- Keywords --

#[derive(Debug, Parser)]
pub struct KeywordsArgs {
    /// Text to analyze
    pub text: String,

    /// Maximum number of keywords to return
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Output as a JSON array
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "nutrirag",
            &mut std::io::stdout(),
        );
    }
}
