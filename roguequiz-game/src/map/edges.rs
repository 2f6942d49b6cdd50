//! Edge construction between consecutive rounds.
//!
//! A greedy pass gives each node one or two forward edges, preferring close,
//! lightly-loaded targets and refusing edges that cross ones already drawn
//! between the same pair of rounds. Repair passes then guarantee every
//! interior node has an incoming and an outgoing edge, crossings or not.
use rand::Rng;

use super::{EdgeKind, MapEdge, MapNode, NodeId};
use crate::config::EdgeTuning;
use crate::constants::MAX_FAN_OUT;
use crate::numbers::usize_to_f64;

/// Two edges between the same pair of rounds cross when their sources and
/// targets are ordered oppositely along x. Edges sharing an endpoint never cross.
#[must_use]
pub fn edges_cross<T: PartialOrd>(a: (T, T), b: (T, T)) -> bool {
    (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1)
}

struct EdgeSet {
    edges: Vec<MapEdge>,
    incoming: Vec<usize>,
    outgoing: Vec<usize>,
}

impl EdgeSet {
    fn new(node_count: usize) -> Self {
        Self {
            edges: Vec::new(),
            incoming: vec![0; node_count],
            outgoing: vec![0; node_count],
        }
    }

    fn contains(&self, source: NodeId, target: NodeId) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    fn add(&mut self, source: NodeId, target: NodeId, kind: EdgeKind) {
        if self.contains(source, target) {
            return;
        }
        self.edges.push(MapEdge {
            source,
            target,
            kind,
        });
        self.outgoing[source.0] += 1;
        self.incoming[target.0] += 1;
    }
}

/// Build every edge of the map. `rounds` lists node ids per round.
pub(crate) fn build_edges<R: Rng + ?Sized>(
    nodes: &[MapNode],
    rounds: &[Vec<NodeId>],
    tuning: &EdgeTuning,
    rng: &mut R,
) -> Vec<MapEdge> {
    let mut set = EdgeSet::new(nodes.len());
    if rounds.len() < 2 {
        return set.edges;
    }
    let last = rounds.len() - 1;
    let x_of = |id: NodeId| nodes.get(id.0).map_or(0.0, |node| node.position.x);

    for round in 0..last.saturating_sub(1) {
        let sources = sorted_by_x(&rounds[round], &x_of);
        let targets = sorted_by_x(&rounds[round + 1], &x_of);
        connect_pair(&sources, &targets, round == 0, tuning, &x_of, &mut set, rng);
    }

    for &source in &rounds[last - 1] {
        for &terminal in &rounds[last] {
            set.add(source, terminal, EdgeKind::Terminal);
        }
    }

    repair_incoming(rounds, &x_of, &mut set);
    repair_outgoing(rounds, &x_of, &mut set);
    set.edges
}

fn sorted_by_x(round: &[NodeId], x_of: &impl Fn(NodeId) -> f64) -> Vec<NodeId> {
    let mut sorted = round.to_vec();
    sorted.sort_by(|a, b| x_of(*a).total_cmp(&x_of(*b)));
    sorted
}

fn connect_pair<R: Rng + ?Sized>(
    sources: &[NodeId],
    targets: &[NodeId],
    from_start: bool,
    tuning: &EdgeTuning,
    x_of: &impl Fn(NodeId) -> f64,
    set: &mut EdgeSet,
    rng: &mut R,
) {
    if targets.is_empty() {
        return;
    }
    let mut committed: Vec<(usize, usize)> = Vec::new();
    for (src_rank, &source) in sources.iter().enumerate() {
        let wanted = if from_start && targets.len() >= 2 {
            2
        } else if rng.gen_bool(tuning.double_edge_probability) {
            2
        } else {
            1
        };
        let wanted = wanted.min(targets.len()).min(MAX_FAN_OUT);

        let source_x = x_of(source);
        let mut ranked: Vec<(usize, f64)> = targets
            .iter()
            .enumerate()
            .map(|(rank, &target)| {
                let distance = (x_of(target) - source_x).abs();
                let load = usize_to_f64(set.incoming[target.0]) * tuning.incoming_penalty;
                (rank, distance + load)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let mut picked = 0;
        for (dst_rank, _) in ranked {
            if picked == wanted {
                break;
            }
            let candidate = (src_rank, dst_rank);
            if committed.iter().any(|done| edges_cross(candidate, *done)) {
                continue;
            }
            set.add(source, targets[dst_rank], EdgeKind::Planned);
            committed.push(candidate);
            picked += 1;
        }

        if picked == 0 {
            let dst_rank = nearest_rank(targets, source_x, x_of);
            log::debug!(
                "no non-crossing edge from {source}; forcing {}",
                targets[dst_rank]
            );
            set.add(source, targets[dst_rank], EdgeKind::Fallback);
            committed.push((src_rank, dst_rank));
        }
    }
}

fn nearest_rank(round: &[NodeId], x: f64, x_of: &impl Fn(NodeId) -> f64) -> usize {
    round
        .iter()
        .enumerate()
        .min_by(|a, b| {
            (x_of(*a.1) - x)
                .abs()
                .total_cmp(&(x_of(*b.1) - x).abs())
        })
        .map_or(0, |(rank, _)| rank)
}

fn repair_incoming(rounds: &[Vec<NodeId>], x_of: &impl Fn(NodeId) -> f64, set: &mut EdgeSet) {
    for round in 1..rounds.len() {
        let previous = &rounds[round - 1];
        if previous.is_empty() {
            continue;
        }
        for &node in &rounds[round] {
            if set.incoming[node.0] > 0 {
                continue;
            }
            let source = previous[nearest_rank(previous, x_of(node), x_of)];
            log::debug!("repairing missing incoming edge {source} -> {node}");
            set.add(source, node, EdgeKind::Repair);
        }
    }
}

fn repair_outgoing(rounds: &[Vec<NodeId>], x_of: &impl Fn(NodeId) -> f64, set: &mut EdgeSet) {
    for round in 0..rounds.len().saturating_sub(1) {
        let next = &rounds[round + 1];
        if next.is_empty() {
            continue;
        }
        for &node in &rounds[round] {
            if set.outgoing[node.0] > 0 {
                continue;
            }
            let target = next[nearest_rank(next, x_of(node), x_of)];
            log::debug!("repairing missing outgoing edge {node} -> {target}");
            set.add(node, target, EdgeKind::Repair);
        }
    }
}
