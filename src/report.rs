//! Artifacts handed to downstream renderers and reviewers.
use crate::cache::{CacheMap, Category};
use crate::enumerate::{StoryPath, Terminus};
use crate::graph::StoryGraph;
use crate::hashing;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// An enumerated path tagged with its identity and passage content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratedPath {
    /// 1-based position in enumeration order.
    pub number: usize,
    pub path_id: String,
    pub route_hash: String,
    pub route: Vec<String>,
    pub terminus: Terminus,
    pub content: BTreeMap<String, String>,
    pub content_fingerprint: String,
}

/// Attach identities and content to enumerated paths, in order.
pub fn identify(graph: &StoryGraph, paths: Vec<StoryPath>) -> Vec<EnumeratedPath> {
    paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| {
            let contents = path
                .route
                .iter()
                .map(|name| graph.passage(name).map(|p| p.content.as_str()).unwrap_or(""))
                .collect::<Vec<_>>();
            let content = path
                .route
                .iter()
                .zip(contents.iter())
                .map(|(name, text)| (name.clone(), text.to_string()))
                .collect();
            EnumeratedPath {
                number: index + 1,
                path_id: hashing::path_id(&path.route),
                route_hash: hashing::route_hash(&path.route),
                content_fingerprint: hashing::content_fingerprint(contents.iter().copied()),
                route: path.route,
                terminus: path.terminus,
                content,
            }
        })
        .collect()
}

/// One warning per path whose `path_id` was already taken by a different
/// route earlier in the run.
pub fn id_collision_warnings(paths: &[EnumeratedPath]) -> Vec<String> {
    let mut first_owner: BTreeMap<&str, &EnumeratedPath> = BTreeMap::new();
    let mut warnings = Vec::new();
    for path in paths {
        match first_owner.get(path.path_id.as_str()) {
            Some(owner) if owner.route_hash != path.route_hash => {
                tracing::warn!(path_id = %path.path_id, "two routes share a path id");
                warnings.push(format!(
                    "path id {} is shared by path {} and path {}; path {} is categorized as new",
                    path.path_id, owner.number, path.number, path.number
                ));
            }
            Some(_) => {}
            None => {
                first_owner.insert(path.path_id.as_str(), path);
            }
        }
    }
    warnings
}

/// Output of the `enumerate` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathListing {
    pub start_passage: String,
    pub max_revisits: usize,
    pub path_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub paths: Vec<EnumeratedPath>,
}

/// An enumerated path with its review state for this run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedPath {
    #[serde(flatten)]
    pub path: EnumeratedPath,
    pub category: Category,
    pub validated: bool,
    pub first_seen: DateTime<Utc>,
    pub created_date: Option<DateTime<Utc>>,
    pub commit_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub new: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl CategoryCounts {
    pub fn record(&mut self, category: Category) {
        match category {
            Category::New => self.new += 1,
            Category::Modified => self.modified += 1,
            Category::Unchanged => self.unchanged += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.modified + self.unchanged
    }
}

impl<'a> FromIterator<&'a Category> for CategoryCounts {
    fn from_iter<I: IntoIterator<Item = &'a Category>>(iter: I) -> Self {
        let mut counts = Self::default();
        for category in iter {
            counts.record(*category);
        }
        counts
    }
}

/// Output of the `categorize` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedReport {
    pub generated_at: DateTime<Utc>,
    pub history_available: bool,
    pub counts: CategoryCounts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub paths: Vec<CategorizedPath>,
}

/// Cache overview for the `status` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub records: usize,
    pub validated: usize,
    pub counts: CategoryCounts,
    pub awaiting_review: Vec<String>,
}

pub fn cache_status(map: &CacheMap) -> CacheStatus {
    CacheStatus {
        records: map.len(),
        validated: map.values().filter(|record| record.validated).count(),
        counts: map.values().map(|record| &record.category).collect(),
        awaiting_review: map
            .values()
            .filter(|record| !record.validated)
            .map(|record| record.path_id.clone())
            .collect(),
    }
}

/// Write an artifact as pretty JSON, or print it when no path is given.
pub fn emit_json<T: Serialize>(out: Option<&Path>, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize report")?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(path, format!("{text}\n"))
                .with_context(|| format!("write {}", path.display()))?;
            tracing::info!(out = %path.display(), "report written");
        }
        None => println!("{text}"),
    }
    Ok(())
}
