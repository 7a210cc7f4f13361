//! CLI argument parsing for the path review workflow.
//!
//! The CLI only wires inputs to the workflow steps; categorization policy
//! lives in the library modules.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "storypaths",
    version,
    about = "Enumerate story paths and track which ones need review",
    after_help = "Commands:\n  enumerate --graph <json>                       List every path with its id\n  categorize --graph <json> --sources <json>     Classify paths and update the cache\n  mark <path_id>...                              Record reviewer sign-off\n  status                                         Summarize the validation cache\n\nExamples:\n  storypaths enumerate --graph build/graph.json --out build/paths.json\n  storypaths categorize --graph build/graph.json --sources build/sources.json\n  storypaths mark 1a2b3c4d 5e6f7a8b\n  storypaths status --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project root: config lookup, default cache location, and history
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Config file (defaults to <root>/storypaths.json when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Enumerate(EnumerateArgs),
    Categorize(CategorizeArgs),
    Mark(MarkArgs),
    Status(StatusArgs),
}

/// Enumerate command inputs.
#[derive(Parser, Debug)]
#[command(about = "Enumerate every path from the start passage")]
pub struct EnumerateArgs {
    /// Story graph JSON produced by the story parser
    #[arg(long, value_name = "PATH")]
    pub graph: PathBuf,

    /// Maximum visits per passage on one path (overrides config)
    #[arg(long, value_name = "N")]
    pub max_revisits: Option<usize>,

    /// Output path for the path list (stdout when omitted)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Categorize command inputs.
#[derive(Parser, Debug)]
#[command(about = "Categorize paths against the last commit and update the cache")]
pub struct CategorizeArgs {
    /// Story graph JSON produced by the story parser
    #[arg(long, value_name = "PATH")]
    pub graph: PathBuf,

    /// Passage to source-file mapping JSON
    #[arg(long, value_name = "PATH")]
    pub sources: PathBuf,

    /// Maximum visits per passage on one path (overrides config)
    #[arg(long, value_name = "N")]
    pub max_revisits: Option<usize>,

    /// Validation cache file (overrides config)
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Skip version history; every path is categorized as new
    #[arg(long)]
    pub no_history: bool,

    /// Drop cache records for paths that no longer exist
    #[arg(long)]
    pub prune: bool,

    /// Output path for the categorized report (stdout when omitted)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Mark command inputs.
#[derive(Parser, Debug)]
#[command(about = "Mark paths as validated (or clear the mark)")]
pub struct MarkArgs {
    /// Path ids to update
    #[arg(value_name = "PATH_ID", required = true)]
    pub path_ids: Vec<String>,

    /// Clear the validated mark instead of setting it
    #[arg(long)]
    pub unset: bool,

    /// Validation cache file (overrides config)
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Summarize the validation cache")]
pub struct StatusArgs {
    /// Validation cache file (overrides config)
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
