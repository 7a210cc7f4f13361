//! Boundary loader for graphs produced by the upstream story parser.
//!
//! Parser output is loosely structured JSON; it is converted into a validated
//! `StoryGraph` here so nothing downstream handles raw values.
use super::{GraphError, Passage, StoryGraph};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Start passage name used when the parser output does not name one.
pub const DEFAULT_START_PASSAGE: &str = "Start";

#[derive(Debug, Deserialize)]
struct RawGraph {
    #[serde(default)]
    start_passage: Option<String>,
    passages: RawPassages,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPassages {
    Map(BTreeMap<String, RawPassage>),
    List(Vec<NamedRawPassage>),
}

#[derive(Debug, Deserialize)]
struct RawPassage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NamedRawPassage {
    name: String,
    #[serde(flatten)]
    body: RawPassage,
}

/// Read and validate a graph JSON file.
pub fn load_graph(path: &Path) -> Result<StoryGraph> {
    let bytes = fs::read(path).with_context(|| format!("read graph {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse graph JSON {}", path.display()))?;
    let graph = graph_from_value(value).with_context(|| format!("load {}", path.display()))?;
    tracing::debug!(
        passages = graph.len(),
        start = graph.start_passage(),
        "story graph loaded"
    );
    for name in unreachable_passages(&graph) {
        tracing::warn!(passage = %name, "passage is unreachable from the start passage");
    }
    Ok(graph)
}

/// Convert parser output into a validated graph.
///
/// Accepts passages either as a name-keyed object or as a list of named
/// entries; `content` and `links` may be omitted.
pub fn graph_from_value(value: Value) -> Result<StoryGraph, GraphError> {
    let raw: RawGraph = serde_json::from_value(value).map_err(|err| GraphError::Malformed {
        reason: err.to_string(),
    })?;
    let passages = match raw.passages {
        RawPassages::Map(map) => map
            .into_iter()
            .map(|(name, body)| Passage::new(name, body.content, body.links))
            .collect::<Vec<_>>(),
        RawPassages::List(list) => list
            .into_iter()
            .map(|entry| Passage::new(entry.name, entry.body.content, entry.body.links))
            .collect::<Vec<_>>(),
    };
    if passages.iter().any(|passage| passage.name.trim().is_empty()) {
        return Err(GraphError::Malformed {
            reason: "passage name must be non-empty".to_string(),
        });
    }
    let start = raw
        .start_passage
        .filter(|start| !start.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_START_PASSAGE.to_string());
    StoryGraph::new(start, passages)
}

/// Passages no route from the start passage can reach, in name order.
pub fn unreachable_passages(graph: &StoryGraph) -> Vec<String> {
    let mut reached = BTreeSet::new();
    let mut pending = vec![graph.start_passage().to_string()];
    while let Some(name) = pending.pop() {
        if !reached.insert(name.clone()) {
            continue;
        }
        if let Some(passage) = graph.passage(&name) {
            pending.extend(
                passage
                    .links
                    .iter()
                    .filter(|target| !reached.contains(*target))
                    .cloned(),
            );
        }
    }
    graph
        .passages()
        .filter(|passage| !reached.contains(&passage.name))
        .map(|passage| passage.name.clone())
        .collect()
}
