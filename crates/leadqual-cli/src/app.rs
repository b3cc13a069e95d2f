//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leadqual")]
#[command(
    author,
    version,
    about = "Qualify sales leads with LLM scoring, outreach drafting and a multi-agent router"
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
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest lead records from a markdown file or directory
    Ingest(IngestArgs),

    /// Find and qualify the best lead for a description
    Query(QueryArgs),

    /// Delete every stored lead in the collection
    Delete,

    /// Start the HTTP server
    Serve(ServeArgs),

    /// Talk to the multi-agent router
    Agent(AgentArgs),

    /// Show store and configuration status
    Status,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Markdown file or directory of markdown files
    pub path: PathBuf,

    /// Maximum characters per chunk
    #[arg(long, default_value_t = leadqual_core::ingest::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Lead description (read from stdin when omitted)
    pub text: Vec<String>,

    /// Product description file (overrides config)
    #[arg(long)]
    pub product: Option<PathBuf>,

    /// Minimum relevance for a lead to be selected (overrides config)
    #[arg(long)]
    pub min_relevance: Option<f64>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Args)]
pub struct AgentArgs {
    /// Message for a single turn (interactive session when omitted)
    pub text: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Cli,
    Json,
}

/// Join positional words into one argument string
pub fn joined(words: &[String]) -> Option<String> {
    let text = words.join(" ");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
