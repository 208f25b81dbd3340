//! Graph model: nodes with display payload and ordered adjacency lists.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Node identifier. Level-built graphs number nodes contiguously from 0.
pub type NodeId = usize;

/// 2D display position. Carried for the renderer, never read by the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// A graph node with its optional display payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub label: Option<String>,
    pub position: Option<Position>,
}

impl Node {
    /// Label to show for this node: the explicit one, else the letter name.
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| letter_label(self.id))
    }
}

/// Immutable graph produced by [`GraphBuilder`](crate::domain::GraphBuilder).
///
/// Every id referenced by an adjacency list is a member of the node set.
/// Nodes iterate in ascending id order; adjacency lists keep the order they
/// were supplied in.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    adjacency: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Graph {
    /// Callers must have validated the adjacency against the node set.
    pub(crate) fn from_parts(
        nodes: BTreeMap<NodeId, Node>,
        adjacency: BTreeMap<NodeId, Vec<NodeId>>,
    ) -> Self {
        debug_assert!(adjacency
            .iter()
            .all(|(from, tos)| nodes.contains_key(from)
                && tos.iter().all(|to| nodes.contains_key(to))));
        Self { nodes, adjacency }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Neighbors of `id` in adjacency-list order; empty for unknown ids.
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All directed edges, grouped by source in id order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(&from, tos)| tos.iter().map(move |&to| (from, to)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed adjacency entries.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Display label for `id`, falling back to the letter name for unknown ids.
    pub fn label(&self, id: NodeId) -> String {
        self.node(id)
            .map(Node::display_label)
            .unwrap_or_else(|| letter_label(id))
    }
}

/// Spreadsheet-style name: 0 -> A, 25 -> Z, 26 -> AA, 27 -> AB.
pub fn letter_label(id: NodeId) -> String {
    let mut n = id + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
