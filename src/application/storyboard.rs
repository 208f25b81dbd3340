//! Storyboard: turns traversal events into paced presentation frames.
//!
//! Each event moves a cursor over the BFS pseudocode, updates the queue
//! caption, or reveals part of the BFS tree. Pacing speeds up as more nodes
//! are revealed; the count is derived from the events consumed so far.
//!
//! Revisits produce no events, so the `if v not visited` check for an
//! already visited neighbour is inferred from the graph: on activation the
//! storyboard lists the node's neighbours, and every neighbour passed over
//! before the next discovery (or left over at the next activation or at
//! completion) gets its own check frame.

use std::collections::VecDeque;
use std::ops::ControlFlow;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::{Event, EventSink, Graph, NodeId};

/// Pseudocode lines with their indent level.
pub const PSEUDOCODE: [(&str, usize); 11] = [
    ("BFS(G, s)", 0),
    ("", 0),
    ("dist[s] = 0", 0),
    ("enqueue(Q, s)", 0),
    ("", 0),
    ("while Q not empty:", 0),
    ("u = dequeue(Q)", 1),
    ("for each neighbor v of u:", 1),
    ("if v not visited:", 2),
    ("dist[v] = dist[u] + 1", 3),
    ("enqueue(Q, v)", 3),
];

const LINE_INIT_DIST: usize = 2;
const LINE_INIT_ENQUEUE: usize = 3;
const LINE_WHILE: usize = 5;
const LINE_DEQUEUE: usize = 6;
const LINE_FOR_EACH: usize = 7;
const LINE_IF_NOT_VISITED: usize = 8;
const LINE_SET_DIST: usize = 9;
const LINE_ENQUEUE: usize = 10;

const CURSOR_TIME: f64 = 0.25;
const DEQUEUE_TIME: f64 = 0.25;
const EDGE_TIME: f64 = 0.25;
const REVEAL_TIME: f64 = 0.25;
const ENQUEUE_TIME: f64 = 0.2;
const START_ENQUEUE_TIME: f64 = 0.3;
const START_REVEAL_TIME: f64 = 0.4;
const FINAL_HOLD_TIME: f64 = 4.0;

/// Speed-up curve: slow while the first nodes appear, then decaying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Nodes revealed at the slow pace
    pub warmup_nodes: usize,
    /// Time multiplier during warmup
    pub warmup_factor: f64,
    /// Per-node multiplier after warmup
    pub decay: f64,
    /// Lower bound of the multiplier
    pub floor: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            warmup_nodes: 4,
            warmup_factor: 5.0,
            decay: 0.8,
            floor: 0.05,
        }
    }
}

impl Pacing {
    /// Time multiplier after `nodes_built` nodes were revealed.
    pub fn factor(&self, nodes_built: usize) -> f64 {
        if nodes_built < self.warmup_nodes {
            return self.warmup_factor;
        }
        let exponent = (nodes_built - self.warmup_nodes) as i32;
        self.decay.powi(exponent).max(self.floor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    /// Cursor moves to a pseudocode line
    Cursor { line: usize },
    /// Queue caption changes
    Queue,
    /// BFS tree edge is drawn
    Edge { from: NodeId, to: NodeId },
    /// BFS tree node appears
    Reveal { node: NodeId, distance: usize },
    /// Traversal finished; final hold
    Finish,
}

/// One paced presentation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub kind: FrameKind,
    /// Pseudocode line under the cursor after this frame
    pub line: usize,
    pub caption: String,
    /// Queue caption after this frame
    pub queue: String,
    /// Seconds
    pub run_time: f64,
}

/// Pseudocode line text with indentation.
pub fn pseudocode_line(line: usize) -> String {
    PSEUDOCODE
        .get(line)
        .map(|(text, indent)| format!("{}{}", "    ".repeat(*indent), text))
        .unwrap_or_default()
}

/// Event consumer building frames for one traversal.
#[derive(Debug)]
pub struct Storyboard<'g> {
    graph: &'g Graph,
    pacing: Pacing,
    frames: Vec<Frame>,
    line: usize,
    queue: String,
    nodes_built: usize,
    previous: Option<Event>,
    start: Option<(NodeId, usize)>,
    pending_reveal: Option<(NodeId, usize)>,
    /// Neighbours of the active node not yet shown at the visited check
    unchecked: VecDeque<NodeId>,
}

impl<'g> Storyboard<'g> {
    pub fn new(graph: &'g Graph, pacing: Pacing) -> Self {
        Self {
            graph,
            pacing,
            frames: Vec::new(),
            line: LINE_INIT_DIST,
            queue: "Queue: []".to_string(),
            nodes_built: 0,
            previous: None,
            start: None,
            pending_reveal: None,
            unchecked: VecDeque::new(),
        }
    }

    /// Consume a whole event log.
    pub fn from_events<'a>(
        graph: &'g Graph,
        pacing: Pacing,
        events: impl IntoIterator<Item = &'a Event>,
    ) -> Self {
        let mut storyboard = Self::new(graph, pacing);
        for event in events {
            storyboard.push(event);
        }
        storyboard
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Nodes revealed so far.
    pub fn nodes_built(&self) -> usize {
        self.nodes_built
    }

    /// Sum of all frame run times.
    pub fn total_time(&self) -> f64 {
        self.frames.iter().map(|f| f.run_time).sum()
    }

    fn speed(&self) -> f64 {
        self.pacing.factor(self.nodes_built)
    }

    fn emit(&mut self, kind: FrameKind, caption: String, run_time: f64) {
        if let FrameKind::Cursor { line } = kind {
            self.line = line;
        }
        self.frames.push(Frame {
            kind,
            line: self.line,
            caption,
            queue: self.queue.clone(),
            run_time,
        });
    }

    fn goto_line(&mut self, line: usize) {
        let run_time = CURSOR_TIME * self.speed();
        self.emit(FrameKind::Cursor { line }, pseudocode_line(line), run_time);
    }

    fn update_queue(&mut self, queue: &[NodeId], run_time: f64) {
        self.queue = format!(
            "Queue: [{}]",
            queue.iter().map(|&id| self.graph.label(id)).join(", ")
        );
        self.emit(FrameKind::Queue, String::new(), run_time);
    }

    fn reveal(&mut self, node: NodeId, distance: usize, run_time: f64) {
        let caption = format!("{} (d={})", self.graph.label(node), distance);
        self.emit(FrameKind::Reveal { node, distance }, caption, run_time);
        self.nodes_built += 1;
    }

    /// Check frames for neighbours skipped as visited, up to `discovered`,
    /// or for all remaining ones when `None`.
    fn check_revisits(&mut self, discovered: Option<NodeId>) {
        while let Some(next) = self.unchecked.pop_front() {
            if Some(next) == discovered {
                break;
            }
            self.goto_line(LINE_IF_NOT_VISITED);
        }
    }

    /// Append the frames for one event.
    pub fn push(&mut self, event: &Event) {
        match event {
            Event::NodeDiscovered { node, distance } => {
                if self.start.is_none() {
                    self.start = Some((*node, *distance));
                    self.goto_line(LINE_INIT_DIST);
                } else {
                    self.check_revisits(Some(*node));
                    self.goto_line(LINE_IF_NOT_VISITED);
                    self.goto_line(LINE_SET_DIST);
                    self.pending_reveal = Some((*node, *distance));
                }
            }
            Event::NodeActivated { node } => {
                self.check_revisits(None);
                self.goto_line(LINE_WHILE);
                self.goto_line(LINE_DEQUEUE);
                self.unchecked = self.graph.neighbors(*node).iter().copied().collect();
            }
            Event::EdgeAdded { from, to } => {
                let caption = format!("{} -> {}", self.graph.label(*from), self.graph.label(*to));
                let run_time = EDGE_TIME * self.speed();
                self.emit(FrameKind::Edge { from: *from, to: *to }, caption, run_time);
                if let Some((node, distance)) = self.pending_reveal.take() {
                    let run_time = REVEAL_TIME * self.speed();
                    self.reveal(node, distance, run_time);
                }
            }
            Event::QueueChanged { queue } => match self.previous {
                Some(Event::NodeActivated { .. }) => {
                    let run_time = DEQUEUE_TIME * self.speed();
                    self.update_queue(queue, run_time);
                    self.goto_line(LINE_FOR_EACH);
                }
                Some(Event::EdgeAdded { .. }) => {
                    self.goto_line(LINE_ENQUEUE);
                    let run_time = ENQUEUE_TIME * self.speed();
                    self.update_queue(queue, run_time);
                }
                _ => {
                    self.goto_line(LINE_INIT_ENQUEUE);
                    self.update_queue(queue, START_ENQUEUE_TIME);
                    if let Some((node, distance)) = self.start {
                        self.reveal(node, distance, START_REVEAL_TIME);
                    }
                }
            },
            Event::TraversalComplete => {
                self.check_revisits(None);
                self.emit(FrameKind::Finish, "done".to_string(), FINAL_HOLD_TIME);
            }
        }
        self.previous = Some(event.clone());
    }
}

impl EventSink for Storyboard<'_> {
    fn accept(&mut self, event: &Event) -> ControlFlow<()> {
        self.push(event);
        ControlFlow::Continue(())
    }
}
