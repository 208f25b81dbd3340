//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::graph::NodeId;

/// Domain errors are configuration or call-time validation failures.
/// They are raised before any graph is returned or any event is emitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("children pattern of level {level} sums to {actual}, but the next level declares {expected} nodes")]
    PatternMismatch {
        level: usize,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} children patterns for {levels} levels, got {actual}")]
    PatternCount {
        levels: usize,
        expected: usize,
        actual: usize,
    },

    #[error("children pattern of level {level} gives children to node {parent}, which does not precede its first child {child}")]
    PatternShape {
        level: usize,
        parent: NodeId,
        child: NodeId,
    },

    #[error("node count of level {level} overflows the id space")]
    CountOverflow { level: usize },

    #[error("edge {from} -> {to} references unknown node {to}")]
    DanglingEdge { from: NodeId, to: NodeId },

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),

    #[error("start node {0} is not part of the graph")]
    UnknownStartNode(NodeId),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
