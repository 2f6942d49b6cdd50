//! Stage-type allocation for interior nodes.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::StageMix;
use crate::constants::FORCED_SLOT_MIN_INTERIOR_ROUNDS;
use crate::numbers::{round_f64_to_usize, usize_to_f64};
use crate::pool::QuestionPools;
use crate::stage::StageType;

/// How many interior nodes get each stage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageTypeCounts {
    pub normal: usize,
    pub elite: usize,
    pub campfire: usize,
}

impl StageTypeCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.normal + self.elite + self.campfire
    }
}

/// Split `interior_total` nodes across stage types.
///
/// Ratios come from `mix` and are rounded; a type whose question pool is empty
/// gets nothing and its share goes to normal. With no scored questions at all
/// the normal share moves to campfire instead, since a normal stage would have
/// nothing to ask. When a map has enough interior rounds, a type that has
/// questions and a non-zero ratio but rounded down to zero takes one slot from
/// normal.
#[must_use]
pub fn allocate_stage_types(
    interior_total: usize,
    interior_rounds: usize,
    pools: &QuestionPools,
    mix: &StageMix,
) -> StageTypeCounts {
    if interior_total == 0 || pools.is_empty() {
        return StageTypeCounts::default();
    }
    let total = usize_to_f64(interior_total);
    let mut elite = round_f64_to_usize(total * mix.elite).min(interior_total);
    let mut campfire = round_f64_to_usize(total * mix.campfire).min(interior_total - elite);
    let mut normal = interior_total - elite - campfire;

    if !pools.has_scored() {
        log::warn!("quiz has no scored questions; elite and normal slots become campfires");
        campfire += normal + elite;
        normal = 0;
        elite = 0;
    }
    if !pools.has_opinion() && campfire > 0 {
        log::warn!("quiz has no opinion questions; {campfire} campfire slots become normal");
        normal += campfire;
        campfire = 0;
    }

    if interior_rounds >= FORCED_SLOT_MIN_INTERIOR_ROUNDS {
        if pools.has_scored() && mix.elite > 0.0 && elite == 0 && normal > 0 {
            normal -= 1;
            elite = 1;
        }
        if pools.has_opinion() && mix.campfire > 0.0 && campfire == 0 && normal > 0 {
            normal -= 1;
            campfire = 1;
        }
    }

    StageTypeCounts {
        normal,
        elite,
        campfire,
    }
}

/// Expand counts into a shuffled stage-type sequence, one entry per interior node.
///
/// The first `first_round_len` entries land in the first interior round, which
/// never holds an elite: any elite there is swapped with the first later normal
/// entry (or, lacking one, the first later campfire), and downgraded to normal
/// when no swap partner exists.
pub fn build_stage_pool<R: Rng + ?Sized>(
    counts: StageTypeCounts,
    first_round_len: usize,
    rng: &mut R,
) -> Vec<StageType> {
    let mut pool = Vec::with_capacity(counts.total());
    pool.extend(std::iter::repeat_n(StageType::Normal, counts.normal));
    pool.extend(std::iter::repeat_n(StageType::Elite, counts.elite));
    pool.extend(std::iter::repeat_n(StageType::Campfire, counts.campfire));
    pool.shuffle(rng);

    let head = first_round_len.min(pool.len());
    for idx in 0..head {
        if pool[idx] != StageType::Elite {
            continue;
        }
        let partner = find_after(&pool, head, StageType::Normal)
            .or_else(|| find_after(&pool, head, StageType::Campfire));
        if let Some(partner) = partner {
            pool.swap(idx, partner);
        } else {
            log::debug!("no swap partner for first-round elite; downgrading to normal");
            pool[idx] = StageType::Normal;
        }
    }
    pool
}

fn find_after(pool: &[StageType], from: usize, kind: StageType) -> Option<usize> {
    pool.iter()
        .enumerate()
        .skip(from)
        .find(|(_, ty)| **ty == kind)
        .map(|(idx, _)| idx)
}
