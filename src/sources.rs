//! Passage to source-unit mapping supplied by the upstream parser.
//!
//! Units are version-controlled files; they are only ever read.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A version-controlled text file that defines one or more passages.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceUnit {
    /// Path as written in the source map, used in logs and reports.
    pub name: String,
    /// Resolved path on disk.
    pub path: PathBuf,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct RawSourceMap {
    #[serde(default)]
    root: Option<PathBuf>,
    passages: BTreeMap<String, Vec<String>>,
}

/// Source units contributing to a route.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteUnits {
    pub units: BTreeSet<SourceUnit>,
    /// Passages on the route with no mapped unit.
    pub unmapped: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct SourceMap {
    passages: BTreeMap<String, Vec<SourceUnit>>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a passage to a unit; a passage may be split across several units.
    pub fn insert(&mut self, passage: impl Into<String>, unit: SourceUnit) {
        let units = self.passages.entry(passage.into()).or_default();
        if !units.contains(&unit) {
            units.push(unit);
        }
    }

    pub fn units_for(&self, passage: &str) -> &[SourceUnit] {
        self.passages
            .get(passage)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Deduplicated units for every passage on a route.
    pub fn units_for_route(&self, route: &[String]) -> RouteUnits {
        let mut out = RouteUnits::default();
        for passage in route {
            let units = self.units_for(passage);
            if units.is_empty() {
                if !out.unmapped.contains(passage) {
                    out.unmapped.push(passage.clone());
                }
                continue;
            }
            out.units.extend(units.iter().cloned());
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

/// Load a source map JSON file.
///
/// Unit paths resolve against `root` when given (itself relative to the map
/// file), otherwise against the directory containing the map.
pub fn load_source_map(path: &Path) -> Result<SourceMap> {
    let bytes = fs::read(path).with_context(|| format!("read source map {}", path.display()))?;
    let raw: RawSourceMap = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse source map JSON {}", path.display()))?;
    let map_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let root = match raw.root {
        Some(root) if root.is_absolute() => root,
        Some(root) => map_dir.join(root),
        None => map_dir.to_path_buf(),
    };
    let mut map = SourceMap::new();
    for (passage, units) in raw.passages {
        for unit in units {
            if unit.trim().is_empty() {
                return Err(anyhow!("empty source unit path for passage {passage:?}"));
            }
            let resolved = root.join(&unit);
            map.insert(passage.clone(), SourceUnit::new(unit, resolved));
        }
    }
    tracing::debug!(passages = map.passages.len(), "source map loaded");
    Ok(map)
}
