//! Procedurally generated stage map.
//!
//! A map is a directed acyclic graph laid out in rounds: round 0 holds the
//! single start node, the last round holds the single terminal node, and every
//! edge connects a node to one in the next round. Generation lives in
//! [`builder`]; this module owns the graph types and their invariant checks.

pub mod alloc;
pub mod builder;
pub mod edges;
pub mod layout;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use thiserror::Error;

use crate::stage::{Stage, StageType};

pub use alloc::{StageTypeCounts, allocate_stage_types, build_stage_pool};
pub use builder::MapGraphBuilder;
pub use edges::edges_cross;
pub use layout::{fallback_layout, is_valid_layout, select_layout};

/// Identifier of a node, unique within its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Screen position; presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    pub id: NodeId,
    pub kind: StageType,
    pub round: usize,
    pub position: Position,
}

/// How an edge came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Chosen by the greedy non-crossing pass.
    Planned,
    /// Forced to the closest target when no non-crossing candidate existed.
    Fallback,
    /// Added by a connectivity repair pass.
    Repair,
    /// Penultimate round to the terminal node.
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

/// Invariant violations reported by [`StageMap::violations`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapViolation {
    #[error("layout must start and end with a single node: {0:?}")]
    LayoutEndpoints(Vec<usize>),
    #[error("layout step {from} -> {to} breaks the growth rule")]
    LayoutGrowth { from: usize, to: usize },
    #[error("{0} has no outgoing edge")]
    MissingOutgoing(NodeId),
    #[error("{0} has no incoming edge")]
    MissingIncoming(NodeId),
    #[error("{0} is not reachable from the start node")]
    Unreachable(NodeId),
    #[error("{0} cannot reach the terminal node")]
    DeadEnd(NodeId),
    #[error("edge {from} -> {to} skips a round")]
    NonAdjacentEdge { from: NodeId, to: NodeId },
    #[error("elite {0} sits in the first interior round")]
    EliteInFirstRound(NodeId),
    #[error("{node} holds {got} questions, expected {expected}")]
    QuestionCount {
        node: NodeId,
        expected: usize,
        got: usize,
    },
}

/// The generated map plus the stage record for every node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageMap {
    layout: Vec<usize>,
    nodes: Vec<MapNode>,
    edges: Vec<MapEdge>,
    rounds: Vec<Vec<NodeId>>,
    stages: BTreeMap<NodeId, Stage>,
}

impl StageMap {
    /// Map with no nodes, returned when the quiz has no usable questions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        layout: Vec<usize>,
        nodes: Vec<MapNode>,
        edges: Vec<MapEdge>,
        rounds: Vec<Vec<NodeId>>,
        stages: BTreeMap<NodeId, Stage>,
    ) -> Self {
        Self {
            layout,
            nodes,
            edges,
            rounds,
            stages,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn layout(&self) -> &[usize] {
        &self.layout
    }

    #[must_use]
    pub fn nodes(&self) -> &[MapNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[MapEdge] {
        &self.edges
    }

    /// Node ids per round, in ascending x order.
    #[must_use]
    pub fn rounds(&self) -> &[Vec<NodeId>] {
        &self.rounds
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&MapNode> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn stage(&self, id: NodeId) -> Option<&Stage> {
        self.stages.get(&id)
    }

    pub(crate) fn stage_mut(&mut self, id: NodeId) -> Option<&mut Stage> {
        self.stages.get_mut(&id)
    }

    pub fn stages(&self) -> impl Iterator<Item = (NodeId, &Stage)> {
        self.stages.iter().map(|(id, stage)| (*id, stage))
    }

    #[must_use]
    pub fn start(&self) -> Option<NodeId> {
        self.rounds.first().and_then(|round| round.first()).copied()
    }

    /// The single node of the last round (an end or roulette node).
    #[must_use]
    pub fn terminal(&self) -> Option<NodeId> {
        self.rounds.last().and_then(|round| round.first()).copied()
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .iter()
            .filter(move |edge| edge.source == id)
            .map(|edge| edge.target)
    }

    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .iter()
            .filter(move |edge| edge.target == id)
            .map(|edge| edge.source)
    }

    #[must_use]
    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    /// Nodes between the start and terminal rounds.
    pub fn interior_nodes(&self) -> impl Iterator<Item = &MapNode> {
        let last = self.rounds.len().saturating_sub(1);
        self.nodes
            .iter()
            .filter(move |node| node.round > 0 && node.round < last)
    }

    /// Count interior nodes per stage type.
    #[must_use]
    pub fn count_kind(&self, kind: StageType) -> usize {
        self.interior_nodes().filter(|node| node.kind == kind).count()
    }

    /// Check every structural invariant; an empty result means the map is sound.
    #[must_use]
    pub fn violations(&self) -> Vec<MapViolation> {
        let mut found = Vec::new();
        if self.is_empty() {
            return found;
        }
        if !layout::has_single_endpoints(&self.layout) {
            found.push(MapViolation::LayoutEndpoints(self.layout.clone()));
        }
        for pair in self.layout.windows(2) {
            if !layout::step_is_valid(pair[0], pair[1]) {
                found.push(MapViolation::LayoutGrowth {
                    from: pair[0],
                    to: pair[1],
                });
            }
        }
        self.check_edges(&mut found);
        self.check_reachability(&mut found);
        self.check_stages(&mut found);
        found
    }

    fn check_edges(&self, found: &mut Vec<MapViolation>) {
        let Some(start) = self.start() else {
            return;
        };
        let Some(terminal) = self.terminal() else {
            return;
        };
        for edge in &self.edges {
            let adjacent = match (self.node(edge.source), self.node(edge.target)) {
                (Some(src), Some(dst)) => dst.round == src.round + 1,
                _ => false,
            };
            if !adjacent {
                found.push(MapViolation::NonAdjacentEdge {
                    from: edge.source,
                    to: edge.target,
                });
            }
        }
        for node in &self.nodes {
            if node.id != terminal && self.outgoing(node.id).next().is_none() {
                found.push(MapViolation::MissingOutgoing(node.id));
            }
            if node.id != start && self.incoming(node.id).next().is_none() {
                found.push(MapViolation::MissingIncoming(node.id));
            }
        }
    }

    fn check_reachability(&self, found: &mut Vec<MapViolation>) {
        let (Some(start), Some(terminal)) = (self.start(), self.terminal()) else {
            return;
        };
        let forward = self.reach(start, |id| self.outgoing(id).collect());
        let backward = self.reach(terminal, |id| self.incoming(id).collect());
        for node in &self.nodes {
            if !forward[node.id.0] {
                found.push(MapViolation::Unreachable(node.id));
            }
            if !backward[node.id.0] {
                found.push(MapViolation::DeadEnd(node.id));
            }
        }
    }

    fn reach(&self, from: NodeId, next: impl Fn(NodeId) -> Vec<NodeId>) -> Vec<bool> {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([from]);
        while let Some(id) = queue.pop_front() {
            let Some(flag) = seen.get_mut(id.0) else {
                continue;
            };
            if *flag {
                continue;
            }
            *flag = true;
            queue.extend(next(id));
        }
        seen
    }

    fn check_stages(&self, found: &mut Vec<MapViolation>) {
        for node in &self.nodes {
            if node.round == 1 && node.kind == StageType::Elite && self.rounds.len() > 2 {
                found.push(MapViolation::EliteInFirstRound(node.id));
            }
            let got = self
                .stage(node.id)
                .map_or(0, |stage| stage.question_indices.len());
            let expected = node.kind.question_count();
            if got != expected {
                found.push(MapViolation::QuestionCount {
                    node: node.id,
                    expected,
                    got,
                });
            }
        }
    }
}
