//! One batch run: enumerate, identify, categorize, merge.
//!
//! The cache enters as a value and leaves as a value; loading and saving it
//! belong to the caller so the whole run can be exercised in memory.
use crate::cache::{self, CacheMap};
use crate::categorize::categorize;
use crate::enumerate::enumerate;
use crate::graph::{GraphError, StoryGraph};
use crate::history::{ChangeDetector, RevisionStore};
use crate::report::{
    id_collision_warnings, identify, CategorizedReport, EnumeratedPath, PathListing,
};
use crate::sources::SourceMap;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub max_revisits: usize,
    pub explosion_threshold: usize,
    /// Drop cache records for paths not enumerated in this run.
    pub prune: bool,
}

/// Result of a categorize run: the report and the cache to persist.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: CategorizedReport,
    pub cache: CacheMap,
    pub pruned: usize,
}

/// Enumerate and identify paths, warning past the explosion threshold.
pub fn list_paths(
    graph: &StoryGraph,
    max_revisits: usize,
    explosion_threshold: usize,
) -> Result<PathListing, GraphError> {
    let paths = identify(graph, enumerate(graph, max_revisits)?);
    let mut warnings = Vec::new();
    if let Some(warning) = explosion_warning(&paths, explosion_threshold) {
        warnings.push(warning);
    }
    warnings.extend(id_collision_warnings(&paths));
    Ok(PathListing {
        start_passage: graph.start_passage().to_string(),
        max_revisits,
        path_count: paths.len(),
        warnings,
        paths,
    })
}

fn explosion_warning(paths: &[EnumeratedPath], threshold: usize) -> Option<String> {
    if paths.len() <= threshold {
        return None;
    }
    tracing::warn!(
        path_count = paths.len(),
        threshold,
        "path count exceeds the soft threshold; review output may be very large"
    );
    Some(format!(
        "path count {} exceeds soft threshold {}",
        paths.len(),
        threshold
    ))
}

/// Run the full categorization against an already loaded cache.
pub fn run_pipeline(
    graph: &StoryGraph,
    sources: &SourceMap,
    store: &dyn RevisionStore,
    existing: &CacheMap,
    options: RunOptions,
    now: DateTime<Utc>,
) -> Result<RunOutcome, GraphError> {
    let listing = list_paths(graph, options.max_revisits, options.explosion_threshold)?;
    tracing::info!(path_count = listing.path_count, "paths enumerated");

    let mut detector = ChangeDetector::new(store);
    let categorization = categorize(&listing.paths, sources, existing, &mut detector, now);

    let mut warnings = listing.warnings;
    if !detector.history_available() {
        warnings.push("version history unavailable; every path categorized as new".to_string());
    }

    let mut merged = cache::merge(existing, categorization.records);
    let pruned = if options.prune {
        let keep = listing
            .paths
            .iter()
            .map(|path| path.path_id.clone())
            .collect::<BTreeSet<_>>();
        let pruned = cache::prune(&mut merged, &keep);
        if pruned > 0 {
            tracing::info!(pruned, "dropped records for paths no longer enumerated");
        }
        pruned
    } else {
        0
    };

    Ok(RunOutcome {
        report: CategorizedReport {
            generated_at: now,
            history_available: detector.history_available(),
            counts: categorization.counts,
            warnings,
            paths: categorization.paths,
        },
        cache: merged,
        pruned,
    })
}
