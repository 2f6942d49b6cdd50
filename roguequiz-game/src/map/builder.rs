//! Map generation: layout, node placement, stage assignment and edges.
use rand::Rng;
use rand::seq::SliceRandom;
use smallvec::SmallVec;
use std::collections::BTreeMap;

use super::alloc::{allocate_stage_types, build_stage_pool};
use super::edges::build_edges;
use super::layout::select_layout;
use super::{MapNode, NodeId, Position, StageMap};
use crate::config::RunConfig;
use crate::constants::{
    ELITE_QUESTION_COUNT, JITTER_SLOT_SHARE, MAP_WIDTH, ROUND_SPACING, SPREAD_FACTOR,
    VERTICAL_JITTER, WAVE_AMPLITUDE, WAVE_FREQUENCY,
};
use crate::numbers::usize_to_f64;
use crate::pool::QuestionPools;
use crate::rng::RngBundle;
use crate::stage::{QuestionIndices, Stage, StageType};

/// Builds a [`StageMap`] for one quiz under one run configuration.
#[derive(Debug, Clone)]
pub struct MapGraphBuilder<'a> {
    pools: &'a QuestionPools,
    cfg: &'a RunConfig,
}

impl<'a> MapGraphBuilder<'a> {
    #[must_use]
    pub const fn new(pools: &'a QuestionPools, cfg: &'a RunConfig) -> Self {
        Self { pools, cfg }
    }

    /// Generate a map, drawing from the bundle's map and question streams.
    ///
    /// Returns an empty map when the quiz has no questions of any kind.
    #[must_use]
    pub fn generate(&self, rng: &mut RngBundle) -> StageMap {
        if self.pools.is_empty() {
            log::warn!("quiz has no usable questions; generating an empty map");
            return StageMap::empty();
        }

        let layout = select_layout(self.cfg.rounds, rng.map());
        let rounds_total = layout.len();
        if rounds_total < 2 {
            log::warn!("{rounds_total} rounds cannot hold a start and an end; generating an empty map");
            return StageMap::empty();
        }
        let interior = &layout[1..rounds_total - 1];
        let interior_total: usize = interior.iter().sum();
        let counts = allocate_stage_types(
            interior_total,
            interior.len(),
            self.pools,
            &self.cfg.stage_mix,
        );
        let first_round_len = interior.first().copied().unwrap_or(0);
        let stage_pool = build_stage_pool(counts, first_round_len, rng.map());
        log::debug!(
            "allocated {} normal / {} elite / {} campfire across {interior_total} interior nodes",
            counts.normal,
            counts.elite,
            counts.campfire
        );

        let terminal_kind = if self.cfg.end_with_roulette {
            StageType::Roulette
        } else {
            StageType::End
        };

        let mut nodes = Vec::new();
        let mut rounds = Vec::with_capacity(rounds_total);
        let mut stage_types = stage_pool.into_iter();
        for (round, &count) in layout.iter().enumerate() {
            let mut ids = Vec::with_capacity(count);
            for index in 0..count {
                let kind = if round == 0 {
                    StageType::Start
                } else if round == rounds_total - 1 {
                    terminal_kind
                } else {
                    stage_types.next().unwrap_or(StageType::Normal)
                };
                let id = NodeId(nodes.len());
                nodes.push(MapNode {
                    id,
                    kind,
                    round,
                    position: node_position(round, index, count),
                });
                ids.push(id);
            }
            rounds.push(ids);
        }

        let mut dealer = QuestionDealer::new(self.pools);
        let mut stages = BTreeMap::new();
        for node in &mut nodes {
            let stage = dealer.deal(node.kind, rng.questions());
            node.kind = stage.stage_type;
            stages.insert(node.id, stage);
        }

        let edges = build_edges(&nodes, &rounds, &self.cfg.edges, rng.map());
        StageMap::from_parts(layout, nodes, edges, rounds, stages)
    }
}

/// Deterministic placement from `(round, index)`. Jitter stays inside a
/// fraction of the slot width so nodes keep their x order within a round.
#[must_use]
pub fn node_position(round: usize, index: usize, count: usize) -> Position {
    let slot = MAP_WIDTH / usize_to_f64(count + 1);
    let base_x = slot * usize_to_f64(index + 1);
    let spread = (base_x - MAP_WIDTH / 2.0) * SPREAD_FACTOR;
    let wave = (usize_to_f64(round) * WAVE_FREQUENCY).sin() * WAVE_AMPLITUDE;
    let jitter = signed_noise(round, index, 0) * slot * JITTER_SLOT_SHARE;
    let y_jitter = if round == 0 || count == 1 {
        0.0
    } else {
        signed_noise(round, index, 1) * VERTICAL_JITTER
    };
    Position {
        x: base_x + spread + wave + jitter,
        y: usize_to_f64(round) * ROUND_SPACING + y_jitter,
    }
}

/// Hash `(round, index, salt)` to a value in `[-1, 1)`.
fn signed_noise(round: usize, index: usize, salt: u64) -> f64 {
    let mut z = (round as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((index as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9))
        .wrapping_add(salt.wrapping_mul(0x94D0_49BB_1331_11EB));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    let unit = f64::from(u32::try_from(z >> 32).unwrap_or(0)) / f64::from(u32::MAX);
    unit.mul_add(2.0, -1.0)
}

/// Draws questions without replacement, reshuffling once a pool runs dry.
struct QuestionDeck {
    pool: Vec<usize>,
    remaining: Vec<usize>,
}

impl QuestionDeck {
    fn new(pool: Vec<usize>) -> Self {
        Self {
            pool,
            remaining: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if self.remaining.is_empty() {
            self.remaining.clone_from(&self.pool);
            self.remaining.shuffle(rng);
        }
        self.remaining.pop()
    }

    /// Three questions for an elite gauntlet; repeats only when the pool is too small.
    fn draw_gauntlet<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<QuestionIndices> {
        if self.pool.is_empty() {
            return None;
        }
        if self.pool.len() >= ELITE_QUESTION_COUNT {
            return Some(
                self.pool
                    .choose_multiple(rng, ELITE_QUESTION_COUNT)
                    .copied()
                    .collect(),
            );
        }
        (0..ELITE_QUESTION_COUNT)
            .map(|_| self.pool.choose(rng).copied())
            .collect()
    }
}

struct QuestionDealer {
    scored: QuestionDeck,
    opinion: QuestionDeck,
}

impl QuestionDealer {
    fn new(pools: &QuestionPools) -> Self {
        Self {
            scored: QuestionDeck::new(pools.scored()),
            opinion: QuestionDeck::new(pools.opinion().to_vec()),
        }
    }

    /// Build the stage for a node, downgrading when the needed pool is empty.
    fn deal<R: Rng + ?Sized>(&mut self, kind: StageType, rng: &mut R) -> Stage {
        match kind {
            StageType::Start | StageType::Roulette | StageType::End => Stage::empty(kind),
            StageType::Elite => match self.scored.draw_gauntlet(rng) {
                Some(questions) => Stage::new(StageType::Elite, questions),
                None => {
                    log::debug!("elite stage downgraded: no scored questions");
                    self.deal(StageType::Normal, rng)
                }
            },
            StageType::Normal => match self.scored.draw(rng) {
                Some(question) => Stage::new(StageType::Normal, single(question)),
                None if !self.opinion.is_empty() => self.deal(StageType::Campfire, rng),
                None => Stage::empty(StageType::Start),
            },
            StageType::Campfire => match self.opinion.draw(rng) {
                Some(question) => Stage::new(StageType::Campfire, single(question)),
                None if !self.scored.is_empty() => self.deal(StageType::Normal, rng),
                None => Stage::empty(StageType::Start),
            },
        }
    }
}

fn single(question: usize) -> QuestionIndices {
    let mut indices = SmallVec::new();
    indices.push(question);
    indices
}
