use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cache;
mod categorize;
mod cli;
mod config;
mod enumerate;
mod graph;
mod hashing;
mod history;
mod pipeline;
mod report;
mod sources;
mod workflow;

use cli::{Command, GlobalArgs, RootArgs};
use workflow::WorkflowContext;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_logging(&args.global);
    let ctx = WorkflowContext::resolve(&args.global)?;

    match args.command {
        Command::Enumerate(args) => workflow::run_enumerate(&ctx, &args),
        Command::Categorize(args) => workflow::run_categorize(&ctx, &args),
        Command::Mark(args) => workflow::run_mark(&ctx, &args),
        Command::Status(args) => workflow::run_status(&ctx, &args),
    }
}

/// `RUST_LOG` wins; otherwise the verbosity flags pick the level. Logs go to
/// stderr so JSON on stdout stays clean.
fn init_logging(global: &GlobalArgs) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if global.quiet {
        EnvFilter::new("warn")
    } else if global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
