//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// txt2kg CLI - Build and inspect knowledge graphs through a txt2kg server.
#[derive(Debug, Parser)]
#[command(name = "txt2kg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Server URL (overrides the config file)
    #[arg(short, long, global = true, env = "TXT2KG_SERVER")]
    pub server: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (one line per triple)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract triples from a text file
    Extract(ExtractArgs),

    /// Import triples from a JSON file into the graph database
    Import(ImportArgs),

    /// Show the stored graph
    Graph(DbArgs),

    /// List stored triples
    Triples(DbArgs),

    /// Delete everything in the graph database
    Clear(ClearArgs),

    /// Search indexed triples by meaning
    Search(SearchArgs),

    /// Read or change server settings
    Settings(SettingsArgs),

    /// Check that the server is up
    Health,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Text file to extract from
    pub file: PathBuf,

    /// LLM provider (ollama, nvidia, vllm)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model for the selected provider
    #[arg(short, long)]
    pub model: Option<String>,

    /// Characters per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared by neighbouring chunks
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Store the extracted triples in the graph database
    #[arg(short, long)]
    pub import: bool,

    /// Graph database type used with --import
    #[arg(short = 't', long = "type")]
    pub db_type: Option<String>,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file: an array of triples or an object with a `triples` array
    pub file: PathBuf,

    /// Graph database type
    #[arg(short = 't', long = "type")]
    pub db_type: Option<String>,
}

/// Graph database selection shared by read commands.
#[derive(Debug, Parser)]
pub struct DbArgs {
    /// Graph database type (neo4j, arangodb, jena)
    #[arg(short = 't', long = "type")]
    pub db_type: Option<String>,
}

/// Arguments for the clear command.
#[derive(Debug, Parser)]
pub struct ClearArgs {
    /// Graph database type
    #[arg(short = 't', long = "type")]
    pub db_type: Option<String>,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Search query text
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

/// Arguments for settings management.
#[derive(Debug, Parser)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: SettingsAction,
}

/// Settings actions.
#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Show one setting, or all of them
    Get {
        /// Setting name
        key: Option<String>,
    },

    /// Change a setting
    Set {
        /// Assignment in the form key=value
        assignment: String,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
