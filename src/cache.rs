//! Durable per-path review state.
//!
//! The cache file is a JSON object keyed by `path_id`. It is read once at the
//! start of a run, merged with the run's records, and rewritten once at the
//! end. A single run owns the file; concurrent writers are not coordinated.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Default cache location, relative to the project root.
pub const DEFAULT_CACHE_REL: &str = "validation-cache.json";

/// Review category of a path relative to the last recorded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    New,
    Modified,
    Unchanged,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::New => "new",
            Category::Modified => "modified",
            Category::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted metadata for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    pub path_id: String,
    /// Display form of the route.
    pub route: String,
    pub route_hash: String,
    /// Set on first observation and never overwritten.
    pub first_seen: DateTime<Utc>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub commit_date: Option<DateTime<Utc>>,
    /// Reviewer sign-off; survives only while the path stays unchanged.
    #[serde(default)]
    pub validated: bool,
    pub category: Category,
    /// Diagnostic only; never consulted when categorizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_fingerprint: Option<String>,
}

pub type CacheMap = BTreeMap<String, PathRecord>;

/// Apply the carry-forward rules to a freshly computed record.
///
/// `first_seen` comes from the earliest record; `validated` survives only when
/// the computed category is `unchanged`. Dates missing from the computed record
/// fall back to the previous ones.
pub fn reconcile(existing: Option<&PathRecord>, computed: PathRecord) -> PathRecord {
    let keep_validation = computed.category == Category::Unchanged;
    match existing {
        None => PathRecord {
            validated: keep_validation && computed.validated,
            ..computed
        },
        Some(previous) => PathRecord {
            first_seen: previous.first_seen,
            validated: keep_validation && previous.validated,
            created_date: computed.created_date.or(previous.created_date),
            commit_date: computed.commit_date.or(previous.commit_date),
            ..computed
        },
    }
}

/// Merge computed records into the existing map.
///
/// Records absent from `computed` are retained untouched.
pub fn merge(existing: &CacheMap, computed: CacheMap) -> CacheMap {
    let mut merged = existing.clone();
    for (path_id, record) in computed {
        let reconciled = reconcile(existing.get(&path_id), record);
        merged.insert(path_id, reconciled);
    }
    merged
}

/// Drop records whose path id is not in `keep`. Returns the number removed.
pub fn prune(map: &mut CacheMap, keep: &BTreeSet<String>) -> usize {
    let before = map.len();
    map.retain(|path_id, _| keep.contains(path_id));
    before - map.len()
}

/// File-backed cache store.
#[derive(Debug, Clone)]
pub struct ValidationCache {
    path: PathBuf,
}

impl ValidationCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache.
    ///
    /// A missing file is an empty cache. A malformed file is discarded with a
    /// warning so the run proceeds as if nothing had been recorded. Other read
    /// failures are errors: silently starting over would drop review state on
    /// the next save.
    pub fn load(&self) -> Result<CacheMap> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::info!(cache = %self.path.display(), "no validation cache; starting empty");
                return Ok(CacheMap::new());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read cache {}", self.path.display()))
            }
        };
        match serde_json::from_slice::<CacheMap>(&bytes) {
            Ok(map) => {
                tracing::debug!(records = map.len(), "validation cache loaded");
                Ok(map)
            }
            Err(err) => {
                tracing::warn!(
                    cache = %self.path.display(),
                    error = %err,
                    "validation cache is malformed; treating every path as new"
                );
                Ok(CacheMap::new())
            }
        }
    }

    /// Write the full map atomically: a temp file in the same directory is
    /// synced and then renamed over the cache.
    pub fn save(&self, map: &CacheMap) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).with_context(|| format!("create {}", parent.display()))?;
        let mut text = serde_json::to_string_pretty(map).context("serialize validation cache")?;
        text.push('\n');
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        tmp.write_all(text.as_bytes())
            .with_context(|| format!("write {}", tmp.path().display()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("sync {}", tmp.path().display()))?;
        tmp.persist(&self.path)
            .with_context(|| format!("publish {}", self.path.display()))?;
        tracing::debug!(records = map.len(), cache = %self.path.display(), "validation cache saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
