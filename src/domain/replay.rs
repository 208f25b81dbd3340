//! Rebuild traversal state from an event log.

use crate::domain::bfs::{Event, TraversalState};
use crate::domain::graph::NodeId;

/// Everything a renderer can know after consuming a prefix of the event log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replay {
    state: TraversalState,
    discovery_order: Vec<NodeId>,
    activation_order: Vec<NodeId>,
    tree_edges: Vec<(NodeId, NodeId)>,
    active: Option<NodeId>,
    consumed: usize,
    complete: bool,
}

impl Replay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a whole log.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut replay = Self::new();
        for event in events {
            replay.apply(event);
        }
        replay
    }

    pub fn apply(&mut self, event: &Event) {
        self.consumed += 1;
        self.state.apply(event);
        match event {
            Event::NodeDiscovered { node, .. } => self.discovery_order.push(*node),
            Event::NodeActivated { node } => {
                self.active = Some(*node);
                self.activation_order.push(*node);
            }
            Event::EdgeAdded { from, to } => self.tree_edges.push((*from, *to)),
            Event::QueueChanged { .. } => {}
            Event::TraversalComplete => {
                self.active = None;
                self.complete = true;
            }
        }
    }

    pub fn state(&self) -> &TraversalState {
        &self.state
    }

    pub fn discovery_order(&self) -> &[NodeId] {
        &self.discovery_order
    }

    pub fn activation_order(&self) -> &[NodeId] {
        &self.activation_order
    }

    pub fn tree_edges(&self) -> &[(NodeId, NodeId)] {
        &self.tree_edges
    }

    /// Node currently being expanded.
    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    /// Number of events applied so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partial_log_when_replaying_then_tracks_prefix() {
        let events = vec![
            Event::NodeDiscovered { node: 4, distance: 0 },
            Event::QueueChanged { queue: vec![4] },
            Event::NodeActivated { node: 4 },
            Event::QueueChanged { queue: vec![] },
            Event::NodeDiscovered { node: 7, distance: 1 },
            Event::EdgeAdded { from: 4, to: 7 },
        ];

        let replay = Replay::from_events(&events);

        assert_eq!(replay.discovery_order(), &[4, 7]);
        assert_eq!(replay.active(), Some(4));
        assert_eq!(replay.tree_edges(), &[(4, 7)]);
        assert!(replay.state().queue.is_empty());
        assert_eq!(replay.consumed(), 6);
        assert!(!replay.is_complete());
    }
}
