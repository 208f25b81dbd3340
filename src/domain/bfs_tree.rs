use generational_arena::{Arena, Index};
use std::collections::HashMap;
use std::fmt;
use termtree::Tree;
use tracing::instrument;

use crate::domain::bfs::Event;
use crate::domain::graph::NodeId;

/// Deepest level `to_termtree` renders.
pub const MAX_RENDER_DEPTH: usize = 256;

/// Data payload for BFS tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    /// Graph node this tree node stands for
    pub node: NodeId,
    /// Hop count from the traversal start
    pub distance: usize,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (d={})", self.node, self.distance)
    }
}

/// Tree node in the arena-based BFS tree.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in discovery order
    pub children: Vec<Index>,
}

/// Arena-based spanning tree of one traversal run.
///
/// Built from `NodeDiscovered` / `EdgeAdded` events; the first discovered
/// node is the root.
#[derive(Debug)]
pub struct BfsTree {
    arena: Arena<TreeNode>,
    root: Option<Index>,
    by_node: HashMap<NodeId, Index>,
}

impl Default for BfsTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BfsTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            by_node: HashMap::new(),
        }
    }

    /// Assemble the tree from an event log.
    ///
    /// A discovery event always precedes the edge that reaches it, so each
    /// edge attaches an already known distance to an already placed parent.
    #[instrument(level = "debug", skip(events))]
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut tree = Self::new();
        let mut distances = HashMap::new();
        for event in events {
            match event {
                Event::NodeDiscovered { node, distance } => {
                    distances.insert(*node, *distance);
                    if tree.root.is_none() {
                        tree.insert_node(
                            NodeData {
                                node: *node,
                                distance: *distance,
                            },
                            None,
                        );
                    }
                }
                Event::EdgeAdded { from, to } => {
                    let parent = tree.by_node.get(from).copied();
                    let distance = distances.get(to).copied().unwrap_or_default();
                    tree.insert_node(
                        NodeData {
                            node: *to,
                            distance,
                        },
                        parent,
                    );
                }
                _ => {}
            }
        }
        tree
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);
        self.by_node.insert(data.node, node_idx);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// Arena index of the tree node standing for graph node `node`.
    pub fn index_of(&self, node: NodeId) -> Option<Index> {
        self.by_node.get(&node).copied()
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order walk, children left to right.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Number of levels; 0 for an empty tree.
    ///
    /// Every tree node carries its hop count, so the deepest one bounds it.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let Some(root) = self.root.and_then(|idx| self.get_node(idx)) else {
            return 0;
        };
        self.arena
            .iter()
            .map(|(_, node)| node.data.distance.saturating_sub(root.data.distance))
            .max()
            .map_or(0, |deepest| deepest + 1)
    }

    /// Graph nodes without tree children, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.node)
            .collect()
    }

    /// Render the tree, labelling each node with `label`.
    ///
    /// Levels past `MAX_RENDER_DEPTH` are cut; a node at the cut with
    /// children gets a single `...` leaf.
    pub fn to_termtree<F>(&self, label: F) -> Tree<String>
    where
        F: Fn(&NodeData) -> String,
    {
        let Some(root) = self.root else {
            return Tree::new("Empty tree".to_string());
        };

        let mut order = Vec::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((idx, level)) = stack.pop() {
            let Some(node) = self.get_node(idx) else {
                continue;
            };
            order.push((idx, level));
            if level + 1 < MAX_RENDER_DEPTH {
                stack.extend(node.children.iter().rev().map(|&child| (child, level + 1)));
            }
        }

        // reverse pre-order: children are built before their parent
        let mut built: HashMap<Index, Tree<String>> = HashMap::new();
        for &(idx, level) in order.iter().rev() {
            let Some(node) = self.get_node(idx) else {
                continue;
            };
            let mut rendered = Tree::new(label(&node.data));
            if level + 1 < MAX_RENDER_DEPTH {
                rendered = rendered
                    .with_leaves(node.children.iter().filter_map(|child| built.remove(child)));
            } else if !node.children.is_empty() {
                rendered.push("...".to_string());
            }
            built.insert(idx, rendered);
        }

        built
            .remove(&root)
            .unwrap_or_else(|| Tree::new(String::new()))
    }
}

pub struct TreeIterator<'a> {
    tree: &'a BfsTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a BfsTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> Vec<Event> {
        vec![
            Event::NodeDiscovered { node: 0, distance: 0 },
            Event::NodeActivated { node: 0 },
            Event::NodeDiscovered { node: 1, distance: 1 },
            Event::EdgeAdded { from: 0, to: 1 },
            Event::NodeDiscovered { node: 2, distance: 1 },
            Event::EdgeAdded { from: 0, to: 2 },
            Event::NodeActivated { node: 1 },
            Event::NodeDiscovered { node: 3, distance: 2 },
            Event::EdgeAdded { from: 1, to: 3 },
            Event::TraversalComplete,
        ]
    }

    //   0
    //  / \
    // 1   2
    // |
    // 3
    #[test]
    fn given_events_when_building_tree_then_shape_matches() {
        let tree = BfsTree::from_events(&sample_events());

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_nodes(), vec![3, 2]);

        let order: Vec<NodeId> = tree.iter().map(|(_, n)| n.data.node).collect();
        assert_eq!(order, vec![0, 1, 3, 2]);

        let three = tree.get_node(tree.index_of(3).unwrap()).unwrap();
        assert_eq!(three.data.distance, 2);
        assert_eq!(three.parent, tree.index_of(1));
    }

    #[test]
    fn given_events_when_rendering_then_labels_nested() {
        let tree = BfsTree::from_events(&sample_events());

        let rendered = tree.to_termtree(|d| d.to_string()).to_string();

        assert!(rendered.starts_with("0 (d=0)\n"));
        assert!(rendered.contains("3 (d=2)"));
    }

    fn path_events(len: usize) -> Vec<Event> {
        let mut events = vec![Event::NodeDiscovered { node: 0, distance: 0 }];
        for node in 1..len {
            events.push(Event::NodeDiscovered { node, distance: node });
            events.push(Event::EdgeAdded { from: node - 1, to: node });
        }
        events
    }

    #[test]
    fn given_long_path_when_measuring_depth_then_no_recursion() {
        let tree = BfsTree::from_events(&path_events(100_000));

        assert_eq!(tree.len(), 100_000);
        assert_eq!(tree.depth(), 100_000);
    }

    #[test]
    fn given_long_path_when_rendering_then_cut_at_max_depth() {
        let tree = BfsTree::from_events(&path_events(100_000));

        let rendered = tree.to_termtree(|d| d.to_string()).to_string();

        assert!(rendered.starts_with("0 (d=0)\n"));
        assert!(rendered.contains("255 (d=255)"));
        assert!(!rendered.contains("256 (d=256)"));
        assert!(rendered.contains("..."));
        assert_eq!(rendered.lines().count(), MAX_RENDER_DEPTH + 1);
    }

    #[test]
    fn given_no_events_when_building_then_empty() {
        let tree = BfsTree::from_events(std::iter::empty::<&Event>());
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.to_termtree(|d| d.to_string()).to_string().trim(), "Empty tree");
    }
}
