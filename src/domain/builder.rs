//! Graph builder for level/pattern specifications and explicit adjacency tables.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::graph::{Graph, Node, NodeId, Position};

/// Tree described by level sizes and per-parent children counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Number of nodes on each level, root level first
    pub sizes: Vec<usize>,
    /// One pattern per level transition: children count of each parent, left to right
    pub children: Vec<Vec<usize>>,
    /// Optional half-spread of each level on the y axis
    #[serde(default)]
    pub ranges: Option<Vec<f64>>,
}

/// Graph described by an explicit node set and adjacency table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdjacencySpec {
    pub nodes: Vec<NodeId>,
    pub adjacency: BTreeMap<NodeId, Vec<NodeId>>,
    pub labels: BTreeMap<NodeId, String>,
    pub positions: BTreeMap<NodeId, Position>,
}

/// Grid parameters for level layouts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Distance between consecutive levels on the x axis
    pub x_step: f64,
    /// Distance between siblings on the y axis when no range hint is given
    pub y_spacing: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            x_step: 1.4,
            y_spacing: 0.5,
        }
    }
}

/// Builds immutable [`Graph`]s. Validation completes before construction starts.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    layout: Layout,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: Layout) -> Self {
        Self { layout }
    }

    /// Build a tree from level sizes and children patterns.
    ///
    /// Node ids are assigned level by level, left to right, starting at 0.
    /// Each pattern must sum to the size of the level after it. Edges point
    /// from parent to child.
    #[instrument(level = "debug", skip(self))]
    pub fn from_levels(&self, spec: &LevelSpec) -> DomainResult<Graph> {
        let plan = Self::plan_edges(spec)?;

        let mut nodes = BTreeMap::new();
        let mut adjacency: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

        let mut level_start = 0;
        for (level, &size) in spec.sizes.iter().enumerate() {
            let range = self.level_range(spec, level, size);
            for (j, y) in linspace(range, -range, size).into_iter().enumerate() {
                let id = level_start + j;
                nodes.insert(
                    id,
                    Node {
                        id,
                        label: None,
                        position: Some(Position::new(level as f64 * self.layout.x_step, y)),
                    },
                );
                adjacency.insert(id, Vec::new());
            }
            level_start += size;
        }

        for (parent, children) in plan {
            adjacency.entry(parent).or_default().extend(children);
        }

        let graph = Graph::from_parts(nodes, adjacency);
        debug!(
            "from_levels: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Build a graph from an explicit adjacency table.
    ///
    /// Undirected graphs must list both directions; nothing is inferred.
    #[instrument(level = "debug", skip(self, spec), fields(nodes = spec.nodes.len()))]
    pub fn from_adjacency(&self, spec: &AdjacencySpec) -> DomainResult<Graph> {
        let mut declared = BTreeSet::new();
        for &id in &spec.nodes {
            if !declared.insert(id) {
                return Err(DomainError::DuplicateNode(id));
            }
        }

        for (&from, tos) in &spec.adjacency {
            if !declared.contains(&from) {
                return Err(DomainError::UnknownNode(from));
            }
            if let Some(&to) = tos.iter().find(|to| !declared.contains(to)) {
                return Err(DomainError::DanglingEdge { from, to });
            }
        }
        if let Some(&id) = spec
            .labels
            .keys()
            .chain(spec.positions.keys())
            .find(|id| !declared.contains(id))
        {
            return Err(DomainError::UnknownNode(id));
        }

        let nodes = declared
            .iter()
            .map(|&id| {
                let node = Node {
                    id,
                    label: spec.labels.get(&id).cloned(),
                    position: spec.positions.get(&id).copied(),
                };
                (id, node)
            })
            .collect();
        let adjacency = spec
            .adjacency
            .iter()
            .map(|(&from, tos)| (from, tos.clone()))
            .collect();

        let graph = Graph::from_parts(nodes, adjacency);
        debug!(
            "from_adjacency: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Validate the specification and assign children to parents.
    ///
    /// Pattern entries are consumed by parents in id order, the parent cursor
    /// carrying over from one pattern to the next; children are handed out in
    /// id order starting at the first node of level 1. When every pattern has
    /// one entry per node of its level this is exactly "parent `j` of level
    /// `i` owns the next `children[i][j]` nodes of level `i + 1`".
    fn plan_edges(spec: &LevelSpec) -> DomainResult<Vec<(NodeId, Range<NodeId>)>> {
        let expected = spec.sizes.len().saturating_sub(1);
        if spec.children.len() != expected {
            return Err(DomainError::PatternCount {
                levels: spec.sizes.len(),
                expected,
                actual: spec.children.len(),
            });
        }

        spec.sizes
            .iter()
            .enumerate()
            .try_fold(0usize, |total, (level, &size)| {
                total
                    .checked_add(size)
                    .ok_or(DomainError::CountOverflow { level })
            })?;

        for (level, pattern) in spec.children.iter().enumerate() {
            let actual = pattern
                .iter()
                .try_fold(0usize, |sum, &count| sum.checked_add(count))
                .ok_or(DomainError::CountOverflow { level })?;
            let expected = spec.sizes[level + 1];
            if actual != expected {
                return Err(DomainError::PatternMismatch {
                    level,
                    expected,
                    actual,
                });
            }
        }

        let mut plan = Vec::new();
        let mut parent = 0;
        let mut next_child = spec.sizes.first().copied().unwrap_or(0);
        for (level, pattern) in spec.children.iter().enumerate() {
            for &count in pattern {
                if count > 0 {
                    if parent >= next_child {
                        return Err(DomainError::PatternShape {
                            level,
                            parent,
                            child: next_child,
                        });
                    }
                    plan.push((parent, next_child..next_child + count));
                    next_child += count;
                }
                parent += 1;
            }
        }
        Ok(plan)
    }

    fn level_range(&self, spec: &LevelSpec, level: usize, size: usize) -> f64 {
        spec.ranges
            .as_ref()
            .and_then(|ranges| ranges.get(level).copied())
            .unwrap_or_else(|| self.layout.y_spacing * size.saturating_sub(1) as f64 / 2.0)
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive; a single value sits at `start`.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
