//! Domain layer: graph model, builder and instrumented traversal
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod bfs;
pub mod bfs_tree;
pub mod builder;
pub mod error;
pub mod graph;
pub mod replay;

pub use bfs::{drive, run, Bfs, Event, EventSink, Outcome, Traversal, TraversalState};
pub use bfs_tree::{BfsTree, NodeData, TreeNode};
pub use builder::{AdjacencySpec, GraphBuilder, Layout, LevelSpec};
pub use error::{DomainError, DomainResult};
pub use graph::{letter_label, Graph, Node, NodeId, Position};
pub use replay::Replay;
