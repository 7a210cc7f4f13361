//! Depth-first path enumeration with a per-branch revisit bound.
//!
//! The number of paths grows with branching and cycles; callers are warned
//! past a soft threshold but enumeration is never truncated.
use crate::graph::{GraphError, Passage, StoryGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Each passage may appear at most twice on one path (one trip around a cycle).
pub const DEFAULT_MAX_REVISITS: usize = 2;

/// Why a path stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminus {
    /// The last passage has no outgoing links.
    Exit,
    /// Every link out of the last passage would exceed the revisit bound.
    CycleBound,
}

/// One complete traversal from the start passage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPath {
    pub route: Vec<String>,
    pub terminus: Terminus,
}

/// One passage on the current branch and the next link to try from it.
struct Frame<'g> {
    passage: &'g Passage,
    next_link: usize,
    followed_any: bool,
}

impl<'g> Frame<'g> {
    fn new(passage: &'g Passage) -> Self {
        Self {
            passage,
            next_link: 0,
            followed_any: false,
        }
    }
}

/// Enumerate every path from the start passage.
///
/// Links are followed in passage link order, so the returned order is stable
/// for a given graph. A link is skipped when following it would visit its
/// target more than `max_revisits` times on the current branch; a passage
/// whose links are all skipped ends its path as [`Terminus::CycleBound`].
/// `max_revisits` below 1 is treated as 1 since the start passage is always
/// visited.
///
/// The route and visit counts are shared by the whole walk: each step pushes
/// one passage and increments its count, and backtracking undoes exactly
/// that, so sibling branches never observe each other's visits and a step
/// costs constant work apart from copying out finished routes.
pub fn enumerate(graph: &StoryGraph, max_revisits: usize) -> Result<Vec<StoryPath>, GraphError> {
    if graph.is_empty() {
        return Err(GraphError::Empty);
    }
    let max_revisits = max_revisits.max(1);
    let start = graph
        .passage(graph.start_passage())
        .ok_or_else(|| GraphError::MissingStartPassage {
            start: graph.start_passage().to_string(),
        })?;

    let mut paths = Vec::new();
    let mut route: Vec<&str> = vec![start.name.as_str()];
    let mut visits: HashMap<&str, usize> = HashMap::from([(start.name.as_str(), 1)]);
    let mut stack = vec![Frame::new(start)];

    while let Some(frame) = stack.last_mut() {
        let passage = frame.passage;
        let next = passage.links[frame.next_link..]
            .iter()
            .position(|target| visits.get(target.as_str()).copied().unwrap_or(0) < max_revisits)
            .map(|offset| frame.next_link + offset);

        let Some(index) = next else {
            if !frame.followed_any {
                let terminus = if passage.is_exit() {
                    Terminus::Exit
                } else {
                    Terminus::CycleBound
                };
                paths.push(StoryPath {
                    route: route.iter().map(|name| name.to_string()).collect(),
                    terminus,
                });
            }
            stack.pop();
            if let Some(name) = route.pop() {
                if let Some(count) = visits.get_mut(name) {
                    *count -= 1;
                }
            }
            continue;
        };

        frame.next_link = index + 1;
        frame.followed_any = true;
        let target = &passage.links[index];
        let child = graph
            .passage(target)
            .ok_or_else(|| GraphError::DanglingLink {
                from: passage.name.clone(),
                target: target.clone(),
            })?;
        route.push(child.name.as_str());
        *visits.entry(child.name.as_str()).or_insert(0) += 1;
        stack.push(Frame::new(child));
    }

    tracing::debug!(path_count = paths.len(), max_revisits, "enumeration complete");
    Ok(paths)
}
