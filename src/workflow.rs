//! Command implementations.
//!
//! Each step resolves config, reads its inputs, calls into the pipeline, and
//! writes its artifacts. The cache is written at most once per command.
use crate::cache::{CacheMap, ValidationCache};
use crate::cli::{CategorizeArgs, EnumerateArgs, GlobalArgs, MarkArgs, StatusArgs};
use crate::config::{resolve_config, HistorySource, ProjectConfig};
use crate::graph::load_graph;
use crate::history::{GitRevisionStore, NoHistory, RevisionStore};
use crate::pipeline::{list_paths, run_pipeline, RunOptions};
use crate::report::{cache_status, emit_json};
use crate::sources::load_source_map;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::path::PathBuf;

/// Resolved settings shared by every command.
pub struct WorkflowContext {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl WorkflowContext {
    pub fn resolve(global: &GlobalArgs) -> Result<Self> {
        let config = resolve_config(&global.root, global.config.as_deref())?;
        Ok(Self {
            root: global.root.clone(),
            config,
        })
    }

    fn max_revisits(&self, flag: Option<usize>) -> Result<usize> {
        match flag {
            Some(0) => Err(anyhow!("--max-revisits must be at least 1")),
            Some(value) => Ok(value),
            None => Ok(self.config.max_revisits),
        }
    }

    fn cache(&self, flag: Option<&PathBuf>) -> ValidationCache {
        let path = flag
            .cloned()
            .unwrap_or_else(|| self.config.cache_path_in(&self.root));
        ValidationCache::new(path)
    }

    fn revision_store(&self, no_history: bool) -> Box<dyn RevisionStore> {
        if no_history || self.config.history == HistorySource::None {
            tracing::info!("version history disabled");
            return Box::new(NoHistory);
        }
        match GitRevisionStore::discover(&self.root) {
            Ok(store) => {
                tracing::debug!(workdir = %store.workdir().display(), "using git history");
                Box::new(store)
            }
            Err(err) => {
                tracing::warn!(root = %self.root.display(), error = %err, "git history unavailable");
                Box::new(NoHistory)
            }
        }
    }
}

pub fn run_enumerate(ctx: &WorkflowContext, args: &EnumerateArgs) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    let max_revisits = ctx.max_revisits(args.max_revisits)?;
    let listing = list_paths(&graph, max_revisits, ctx.config.explosion_threshold)
        .context("enumerate paths")?;
    tracing::info!(path_count = listing.path_count, "paths enumerated");
    emit_json(args.out.as_deref(), &listing)
}

pub fn run_categorize(ctx: &WorkflowContext, args: &CategorizeArgs) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    let sources = load_source_map(&args.sources)?;
    if sources.is_empty() {
        tracing::warn!("source map is empty; every path will be categorized as new");
    }
    let options = RunOptions {
        max_revisits: ctx.max_revisits(args.max_revisits)?,
        explosion_threshold: ctx.config.explosion_threshold,
        prune: args.prune,
    };
    let cache = ctx.cache(args.cache.as_ref());
    let existing = cache.load()?;
    let store = ctx.revision_store(args.no_history);

    let outcome = run_pipeline(&graph, &sources, store.as_ref(), &existing, options, Utc::now())
        .context("categorize paths")?;
    cache.save(&outcome.cache)?;
    tracing::info!(
        paths = outcome.report.counts.total(),
        records = outcome.cache.len(),
        pruned = outcome.pruned,
        cache = %cache.path().display(),
        "validation cache updated"
    );
    emit_json(args.out.as_deref(), &outcome.report)
}

pub fn run_mark(ctx: &WorkflowContext, args: &MarkArgs) -> Result<()> {
    let cache = ctx.cache(args.cache.as_ref());
    let mut map = cache.load()?;
    set_validated(&mut map, &args.path_ids, !args.unset)?;
    cache.save(&map)?;
    for path_id in &args.path_ids {
        println!(
            "{path_id}: {}",
            if args.unset { "unvalidated" } else { "validated" }
        );
    }
    Ok(())
}

/// Update the validated flag on existing records; unknown ids abort without
/// touching any record.
fn set_validated(map: &mut CacheMap, path_ids: &[String], validated: bool) -> Result<()> {
    let unknown = path_ids
        .iter()
        .filter(|path_id| !map.contains_key(*path_id))
        .cloned()
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        return Err(anyhow!("unknown path ids: {}", unknown.join(", ")));
    }
    for path_id in path_ids {
        if let Some(record) = map.get_mut(path_id) {
            record.validated = validated;
        }
    }
    Ok(())
}

pub fn run_status(ctx: &WorkflowContext, args: &StatusArgs) -> Result<()> {
    let cache = ctx.cache(args.cache.as_ref());
    let map = cache.load()?;
    let status = cache_status(&map);
    if args.json {
        return emit_json(None, &status);
    }
    println!("cache: {}", cache.path().display());
    println!(
        "records: {} ({} validated)",
        status.records, status.validated
    );
    println!(
        "new: {}  modified: {}  unchanged: {}",
        status.counts.new, status.counts.modified, status.counts.unchanged
    );
    if !status.awaiting_review.is_empty() {
        println!("awaiting review:");
        for path_id in &status.awaiting_review {
            if let Some(record) = map.get(path_id) {
                println!("  {path_id} [{}] {}", record.category, record.route);
            }
        }
    }
    Ok(())
}
