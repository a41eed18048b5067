use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use proofread_core::JsonFileStore;
use proofread_types::CategoryFilter;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Debug, Parser)]
#[command(name = "proofread", version, about = "Streamed AI proofreading for Chinese text")]
struct Cli {
    /// Directory holding config.json, history.json and thesaurus.json.
    #[arg(long, global = true, env = "PROOFREAD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a TXT/Markdown file and print the issues found.
    Check(CheckArgs),
    /// Inspect or edit past checks.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Manage custom correction groups.
    Thesaurus {
        #[command(subcommand)]
        action: ThesaurusAction,
    },
    /// Show or change the model configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Character diff between two files.
    Diff { old: PathBuf, new: PathBuf },
}

#[derive(Debug, Args)]
struct CheckArgs {
    file: PathBuf,
    /// Accept every pending issue in a category ("all", "错别字", "grammar", ...).
    #[arg(long = "fix", value_name = "CATEGORY")]
    fix: Vec<CategoryFilter>,
    /// Ignore every pending issue in a category.
    #[arg(long = "ignore", value_name = "CATEGORY")]
    ignore: Vec<CategoryFilter>,
    /// Write the resulting text here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Do not record this check in the history.
    #[arg(long)]
    no_history: bool,
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    List,
    /// Print an entry with every suggestion applied.
    Show { timestamp: String },
    Delete { timestamp: String },
    Clear,
}

#[derive(Debug, Subcommand)]
enum ThesaurusAction {
    List,
    AddGroup { name: String },
    DeleteGroup { id: String },
    Toggle { id: String },
    Add { group: String, original: String, suggestion: String },
    Remove { group: String, original: String },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Set {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        model: Option<String>,
        /// Read the system prompt from this file.
        #[arg(long)]
        prompt_file: Option<PathBuf>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    Reset,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = match cli.data_dir {
        Some(dir) => JsonFileStore::new(dir),
        None => JsonFileStore::open_default().context("no data directory; pass --data-dir")?,
    };
    tracing::debug!(dir = %store.dir().display(), "using data directory");

    match cli.command {
        Command::Check(args) => commands::check(&store, args).await,
        Command::History { action } => commands::history(&store, action).await,
        Command::Thesaurus { action } => commands::thesaurus(&store, action).await,
        Command::Config { action } => commands::config(&store, action).await,
        Command::Diff { old, new } => commands::diff(&old, &new).await,
    }
}
