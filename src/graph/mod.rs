//! In-memory story graph: passages, their ordered choice links, and the start
//! passage.
//!
//! A `StoryGraph` can only be built through validation, so every consumer
//! downstream of the loader works on a well-formed graph.
mod load;

pub use load::{graph_from_value, load_graph};

use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Structural problems that make a graph unusable for enumeration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("story graph has no passages")]
    Empty,
    #[error("start passage {start:?} is not defined")]
    MissingStartPassage { start: String },
    #[error("passage {from:?} links to undefined passage {target:?}")]
    DanglingLink { from: String, target: String },
    #[error("passage {name:?} is defined more than once")]
    DuplicatePassage { name: String },
    #[error("malformed story graph: {reason}")]
    Malformed { reason: String },
}

/// A named unit of narrative text with outgoing choice links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub name: String,
    pub content: String,
    /// Link targets in authoring order; enumeration follows this order.
    pub links: Vec<String>,
}

impl Passage {
    pub fn new(name: impl Into<String>, content: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            links,
        }
    }

    pub fn is_exit(&self) -> bool {
        self.links.is_empty()
    }
}

/// Validated passage graph with a resolvable start passage.
#[derive(Debug, Clone)]
pub struct StoryGraph {
    start_passage: String,
    passages: BTreeMap<String, Passage>,
}

impl StoryGraph {
    /// Build a graph, rejecting empty graphs, duplicate names, a missing start
    /// passage, and links to undefined passages.
    ///
    /// Repeated link targets within one passage collapse to their first
    /// occurrence: a route is a passage sequence, so two choices leading to the
    /// same passage cannot produce distinguishable paths.
    pub fn new(
        start_passage: impl Into<String>,
        passages: Vec<Passage>,
    ) -> Result<Self, GraphError> {
        let start_passage = start_passage.into();
        if passages.is_empty() {
            return Err(GraphError::Empty);
        }
        let mut by_name = BTreeMap::new();
        for mut passage in passages {
            let mut seen = HashSet::new();
            passage.links.retain(|target| seen.insert(target.clone()));
            if by_name.contains_key(&passage.name) {
                return Err(GraphError::DuplicatePassage { name: passage.name });
            }
            by_name.insert(passage.name.clone(), passage);
        }
        if !by_name.contains_key(&start_passage) {
            return Err(GraphError::MissingStartPassage {
                start: start_passage,
            });
        }
        for passage in by_name.values() {
            if let Some(target) = passage
                .links
                .iter()
                .find(|target| !by_name.contains_key(*target))
            {
                return Err(GraphError::DanglingLink {
                    from: passage.name.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(Self {
            start_passage,
            passages: by_name,
        })
    }

    pub fn start_passage(&self) -> &str {
        &self.start_passage
    }

    pub fn passage(&self, name: &str) -> Option<&Passage> {
        self.passages.get(name)
    }

    /// Passages in name order.
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.passages.values()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}
