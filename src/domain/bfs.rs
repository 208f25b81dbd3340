//! Instrumented breadth-first search.
//!
//! The traversal is a lazy event generator: every state change is reported
//! as an [`Event`], in the order it happens, so a renderer can replay the
//! search without running it again.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::graph::{Graph, NodeId};

/// Observable state change of a traversal run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Node was seen for the first time and got its final distance
    NodeDiscovered { node: NodeId, distance: usize },
    /// Node was taken from the queue head and is being expanded
    NodeActivated { node: NodeId },
    /// BFS-tree edge from the expanded node to a newly discovered one
    EdgeAdded { from: NodeId, to: NodeId },
    /// Queue contents after an enqueue or dequeue, head first
    QueueChanged { queue: Vec<NodeId> },
    /// Queue ran empty
    TraversalComplete,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::NodeDiscovered { node, distance } => {
                write!(f, "discovered {} (d={})", node, distance)
            }
            Event::NodeActivated { node } => write!(f, "activated {}", node),
            Event::EdgeAdded { from, to } => write!(f, "edge {} -> {}", from, to),
            Event::QueueChanged { queue } => write!(f, "queue {:?}", queue),
            Event::TraversalComplete => write!(f, "complete"),
        }
    }
}

/// Mutable state of one traversal run.
///
/// `visited` only grows, each `distance` is written once, and `queue` only
/// changes by pushing at the tail or popping at the head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalState {
    pub visited: BTreeSet<NodeId>,
    pub distance: BTreeMap<NodeId, usize>,
    pub queue: VecDeque<NodeId>,
}

impl TraversalState {
    /// Apply the change `event` describes.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::NodeDiscovered { node, distance } => {
                self.visited.insert(*node);
                self.distance.insert(*node, *distance);
            }
            Event::QueueChanged { queue } => {
                self.queue = queue.iter().copied().collect();
            }
            Event::NodeActivated { .. } | Event::EdgeAdded { .. } | Event::TraversalComplete => {}
        }
    }

    fn snapshot_with(&self, tail: NodeId) -> Vec<NodeId> {
        self.queue.iter().copied().chain([tail]).collect()
    }

    fn snapshot_without_head(&self) -> Vec<NodeId> {
        self.queue.iter().skip(1).copied().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Dequeue,
    Expand { node: NodeId, next: usize },
    Done,
}

/// Lazy breadth-first traversal yielding [`Event`]s.
///
/// Each transition is decided on the current state, but its changes are
/// applied one event at a time as the events are yielded. After each yielded
/// event [`Bfs::state`] therefore equals a replay of the events so far.
/// Dropping the iterator early leaves nothing behind.
#[derive(Debug, Clone)]
pub struct Bfs<'g> {
    graph: &'g Graph,
    start: NodeId,
    state: TraversalState,
    pending: VecDeque<Event>,
    phase: Phase,
}

impl<'g> Bfs<'g> {
    /// Prepare a traversal from `start`. Fails before any event exists when
    /// `start` is not a node of `graph`.
    pub fn new(graph: &'g Graph, start: NodeId) -> DomainResult<Self> {
        if !graph.contains(start) {
            return Err(DomainError::UnknownStartNode(start));
        }
        Ok(Self {
            graph,
            start,
            state: TraversalState::default(),
            pending: VecDeque::new(),
            phase: Phase::Start,
        })
    }

    pub fn state(&self) -> &TraversalState {
        &self.state
    }

    pub fn into_state(self) -> TraversalState {
        self.state
    }

    /// Advance the state machine by one transition, queueing its events.
    /// Only called once every earlier event has been applied.
    fn step(&mut self) {
        match self.phase {
            Phase::Start => {
                self.pending.push_back(Event::NodeDiscovered {
                    node: self.start,
                    distance: 0,
                });
                self.pending.push_back(Event::QueueChanged {
                    queue: self.state.snapshot_with(self.start),
                });
                self.phase = Phase::Dequeue;
            }
            Phase::Dequeue => match self.state.queue.front().copied() {
                Some(node) => {
                    self.pending.push_back(Event::NodeActivated { node });
                    self.pending.push_back(Event::QueueChanged {
                        queue: self.state.snapshot_without_head(),
                    });
                    self.phase = Phase::Expand { node, next: 0 };
                }
                None => {
                    self.pending.push_back(Event::TraversalComplete);
                    self.phase = Phase::Done;
                }
            },
            Phase::Expand { node, next } => {
                let graph = self.graph;
                let neighbors = graph.neighbors(node);
                let found = neighbors[next.min(neighbors.len())..]
                    .iter()
                    .position(|v| !self.state.visited.contains(v))
                    .map(|offset| next + offset);

                match found {
                    Some(index) => {
                        let to = neighbors[index];
                        let distance = self.state.distance.get(&node).copied().unwrap_or(0) + 1;
                        self.pending.push_back(Event::NodeDiscovered { node: to, distance });
                        self.pending.push_back(Event::EdgeAdded { from: node, to });
                        self.pending.push_back(Event::QueueChanged {
                            queue: self.state.snapshot_with(to),
                        });
                        self.phase = Phase::Expand {
                            node,
                            next: index + 1,
                        };
                    }
                    None => self.phase = Phase::Dequeue,
                }
            }
            Phase::Done => {}
        }
    }
}

impl Iterator for Bfs<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        while self.pending.is_empty() && self.phase != Phase::Done {
            self.step();
        }
        let event = self.pending.pop_front()?;
        trace!("{}", event);
        self.state.apply(&event);
        Some(event)
    }
}

/// Completed traversal: the full event log and the final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    pub start: NodeId,
    pub events: Vec<Event>,
    pub state: TraversalState,
}

impl Traversal {
    /// Nodes in the order they were activated.
    pub fn activation_order(&self) -> Vec<NodeId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::NodeActivated { node } => Some(*node),
                _ => None,
            })
            .collect()
    }

    /// Nodes with their distances, in discovery order.
    pub fn discoveries(&self) -> Vec<(NodeId, usize)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::NodeDiscovered { node, distance } => Some((*node, *distance)),
                _ => None,
            })
            .collect()
    }
}

/// Run a traversal to completion and collect its events.
#[instrument(level = "debug", skip(graph))]
pub fn run(graph: &Graph, start: NodeId) -> DomainResult<Traversal> {
    let mut bfs = Bfs::new(graph, start)?;
    let events: Vec<Event> = bfs.by_ref().collect();
    debug!("run: {} events", events.len());
    Ok(Traversal {
        start,
        events,
        state: bfs.into_state(),
    })
}

/// Push-based consumer of traversal events.
///
/// Each event is fully handled before the next one is produced.
pub trait EventSink {
    fn accept(&mut self, event: &Event) -> ControlFlow<()>;
}

impl<F> EventSink for F
where
    F: FnMut(&Event) -> ControlFlow<()>,
{
    fn accept(&mut self, event: &Event) -> ControlFlow<()> {
        self(event)
    }
}

impl EventSink for Vec<Event> {
    fn accept(&mut self, event: &Event) -> ControlFlow<()> {
        self.push(event.clone());
        ControlFlow::Continue(())
    }
}

/// How a push-driven traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed { emitted: usize },
    /// The sink stopped consumption after `emitted` events
    Abandoned { emitted: usize },
}

/// Run a traversal, pushing every event into `sink` until it breaks.
#[instrument(level = "debug", skip(graph, sink))]
pub fn drive<S>(graph: &Graph, start: NodeId, sink: &mut S) -> DomainResult<Outcome>
where
    S: EventSink + ?Sized,
{
    let mut emitted = 0;
    for event in Bfs::new(graph, start)? {
        emitted += 1;
        if sink.accept(&event).is_break() {
            debug!("drive: abandoned after {} events", emitted);
            return Ok(Outcome::Abandoned { emitted });
        }
    }
    Ok(Outcome::Completed { emitted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::{AdjacencySpec, GraphBuilder};

    fn small_cycle() -> Graph {
        let spec = AdjacencySpec {
            nodes: vec![0, 1, 2, 3],
            adjacency: BTreeMap::from([
                (0, vec![1, 2]),
                (1, vec![0, 3]),
                (2, vec![0]),
                (3, vec![1]),
            ]),
            ..Default::default()
        };
        GraphBuilder::new().from_adjacency(&spec).unwrap()
    }

    #[test]
    fn given_small_cycle_when_running_then_emits_exact_sequence() {
        let traversal = run(&small_cycle(), 0).unwrap();

        use Event::*;
        assert_eq!(
            traversal.events,
            vec![
                NodeDiscovered { node: 0, distance: 0 },
                QueueChanged { queue: vec![0] },
                NodeActivated { node: 0 },
                QueueChanged { queue: vec![] },
                NodeDiscovered { node: 1, distance: 1 },
                EdgeAdded { from: 0, to: 1 },
                QueueChanged { queue: vec![1] },
                NodeDiscovered { node: 2, distance: 1 },
                EdgeAdded { from: 0, to: 2 },
                QueueChanged { queue: vec![1, 2] },
                NodeActivated { node: 1 },
                QueueChanged { queue: vec![2] },
                NodeDiscovered { node: 3, distance: 2 },
                EdgeAdded { from: 1, to: 3 },
                QueueChanged { queue: vec![2, 3] },
                NodeActivated { node: 2 },
                QueueChanged { queue: vec![3] },
                NodeActivated { node: 3 },
                QueueChanged { queue: vec![] },
                TraversalComplete,
            ]
        );
    }

    #[test]
    fn given_lazy_iterator_when_stepping_then_state_matches_last_event() {
        let graph = small_cycle();
        let mut bfs = Bfs::new(&graph, 0).unwrap();

        assert_eq!(bfs.next(), Some(Event::NodeDiscovered { node: 0, distance: 0 }));
        assert_eq!(bfs.state().visited.len(), 1);
        assert!(bfs.state().queue.is_empty());

        assert_eq!(bfs.next(), Some(Event::QueueChanged { queue: vec![0] }));
        assert_eq!(bfs.state().queue, VecDeque::from([0]));

        assert_eq!(bfs.next(), Some(Event::NodeActivated { node: 0 }));
        assert_eq!(bfs.state().queue, VecDeque::from([0]));

        assert_eq!(bfs.next(), Some(Event::QueueChanged { queue: vec![] }));
        assert!(bfs.state().queue.is_empty());
    }

    #[test]
    fn given_unknown_start_when_creating_then_errors() {
        let graph = small_cycle();
        assert_eq!(
            Bfs::new(&graph, 99).unwrap_err(),
            DomainError::UnknownStartNode(99)
        );
    }

    #[test]
    fn given_breaking_sink_when_driving_then_abandons() {
        let graph = small_cycle();
        let mut seen = 0;
        let mut sink = |_: &Event| {
            seen += 1;
            if seen == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };

        let outcome = drive(&graph, 0, &mut sink).unwrap();

        assert_eq!(outcome, Outcome::Abandoned { emitted: 3 });
    }

    #[test]
    fn given_vec_sink_when_driving_then_matches_run() {
        let graph = small_cycle();
        let mut events: Vec<Event> = Vec::new();

        let outcome = drive(&graph, 2, &mut events).unwrap();

        assert_eq!(outcome, Outcome::Completed { emitted: events.len() });
        assert_eq!(events, run(&graph, 2).unwrap().events);
    }

    #[test]
    fn given_event_when_serialized_then_internally_tagged() {
        let json = serde_json::to_string(&Event::NodeDiscovered { node: 1, distance: 1 }).unwrap();
        assert_eq!(json, r#"{"kind":"node_discovered","node":1,"distance":1}"#);

        let json = serde_json::to_string(&Event::TraversalComplete).unwrap();
        assert_eq!(json, r#"{"kind":"traversal_complete"}"#);
    }

    #[test]
    fn given_event_when_displayed_then_uses_raw_ids() {
        assert_eq!(Event::NodeDiscovered { node: 3, distance: 2 }.to_string(), "discovered 3 (d=2)");
        assert_eq!(Event::QueueChanged { queue: vec![1, 2] }.to_string(), "queue [1, 2]");
        assert_eq!(Event::TraversalComplete.to_string(), "complete");
    }
}
