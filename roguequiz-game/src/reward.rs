//! Reward boxes and temporary buffs.
//!
//! A reward box shows three sealed choices. For normal and elite stages each
//! choice hides a uniform draw from the stage type's point range, rolled only
//! when the choice is opened. Campfires instead reveal three multipliers drawn
//! from the catalogue and scale the running score by the chosen one.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::config::{PointRange, RewardTuning};
use crate::constants::REWARD_BOX_CHOICES;
use crate::numbers::{floor_f64_to_i64, i64_to_f64};
use crate::stage::StageType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("reward box was already opened")]
    AlreadyOpened,
    #[error("choice {choice} is out of range; the box has {choices} choices")]
    ChoiceOutOfRange { choice: usize, choices: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardKind {
    Points { range: PointRange },
    Multipliers { choices: SmallVec<[f64; REWARD_BOX_CHOICES]> },
}

/// What opening a choice granted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardGrant {
    Points { points: i64 },
    Multiplied { multiplier: f64, before: i64, after: i64 },
}

impl RewardGrant {
    /// Change to the running score this grant caused.
    #[must_use]
    pub const fn delta(&self) -> i64 {
        match *self {
            Self::Points { points } => points,
            Self::Multiplied { before, after, .. } => after - before,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardBox {
    stage_type: StageType,
    kind: RewardKind,
    opened: Option<usize>,
}

impl RewardBox {
    /// Offer the box earned by clearing a stage of `stage_type`.
    pub fn for_stage<R: Rng + ?Sized>(
        stage_type: StageType,
        tuning: &RewardTuning,
        rng: &mut R,
    ) -> Self {
        let kind = match stage_type {
            StageType::Campfire => RewardKind::Multipliers {
                choices: tuning
                    .campfire_multipliers
                    .choose_multiple(rng, REWARD_BOX_CHOICES)
                    .copied()
                    .collect(),
            },
            StageType::Normal => RewardKind::Points {
                range: tuning.normal,
            },
            StageType::Elite => RewardKind::Points {
                range: tuning.elite,
            },
            StageType::Start | StageType::Roulette | StageType::End => RewardKind::Points {
                range: tuning.fallback,
            },
        };
        Self {
            stage_type,
            kind,
            opened: None,
        }
    }

    #[must_use]
    pub const fn stage_type(&self) -> StageType {
        self.stage_type
    }

    #[must_use]
    pub const fn kind(&self) -> &RewardKind {
        &self.kind
    }

    #[must_use]
    pub fn choices(&self) -> usize {
        match &self.kind {
            RewardKind::Points { .. } => REWARD_BOX_CHOICES,
            RewardKind::Multipliers { choices } => choices.len(),
        }
    }

    #[must_use]
    pub const fn is_opened(&self) -> bool {
        self.opened.is_some()
    }

    /// Open one choice against the current running score. The other choices
    /// are discarded unseen.
    ///
    /// # Errors
    ///
    /// Fails if a choice was already opened or `choice` is out of range.
    pub fn open<R: Rng + ?Sized>(
        &mut self,
        choice: usize,
        current_score: i64,
        rng: &mut R,
    ) -> Result<RewardGrant, RewardError> {
        if self.opened.is_some() {
            return Err(RewardError::AlreadyOpened);
        }
        let choices = self.choices();
        if choice >= choices {
            return Err(RewardError::ChoiceOutOfRange { choice, choices });
        }
        let grant = match &self.kind {
            RewardKind::Points { range } => RewardGrant::Points {
                points: rng.gen_range(range.min..=range.max),
            },
            RewardKind::Multipliers { choices } => {
                let multiplier = choices.get(choice).copied().unwrap_or(1.0);
                RewardGrant::Multiplied {
                    multiplier,
                    before: current_score,
                    after: floor_f64_to_i64(i64_to_f64(current_score) * multiplier),
                }
            }
        };
        self.opened = Some(choice);
        Ok(grant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuffEffect {
    /// Seconds added to every question timer.
    ExtraTime { seconds: u32 },
    /// Percentage added to reward-box point draws.
    PointBoost { percent: u32 },
}

/// A buff that lasts for a number of completed stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporaryBuff {
    pub effect: BuffEffect,
    pub remaining_stages: u32,
}

impl TemporaryBuff {
    #[must_use]
    pub const fn new(effect: BuffEffect, remaining_stages: u32) -> Self {
        Self {
            effect,
            remaining_stages,
        }
    }
}

/// Total extra seconds granted by active buffs.
#[must_use]
pub fn extra_time(buffs: &[TemporaryBuff]) -> u32 {
    buffs
        .iter()
        .filter_map(|buff| match buff.effect {
            BuffEffect::ExtraTime { seconds } => Some(seconds),
            BuffEffect::PointBoost { .. } => None,
        })
        .fold(0, u32::saturating_add)
}

/// Apply every active point boost to a reward draw.
#[must_use]
pub fn boosted_points(points: i64, buffs: &[TemporaryBuff]) -> i64 {
    let percent: u32 = buffs
        .iter()
        .filter_map(|buff| match buff.effect {
            BuffEffect::PointBoost { percent } => Some(percent),
            BuffEffect::ExtraTime { .. } => None,
        })
        .fold(0, u32::saturating_add);
    if percent == 0 {
        return points;
    }
    points.saturating_mul(100 + i64::from(percent)) / 100
}

/// Count every buff down by one stage and drop the expired ones.
pub fn tick_buffs(buffs: &mut Vec<TemporaryBuff>) {
    for buff in buffs.iter_mut() {
        buff.remaining_stages = buff.remaining_stages.saturating_sub(1);
    }
    buffs.retain(|buff| buff.remaining_stages > 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn point_draws_stay_in_stage_range() {
        let tuning = RewardTuning::default();
        let mut rng = SmallRng::seed_from_u64(21);
        for (stage_type, range) in [
            (StageType::Normal, tuning.normal),
            (StageType::Elite, tuning.elite),
            (StageType::Roulette, tuning.fallback),
        ] {
            for choice in 0..3 {
                let mut reward = RewardBox::for_stage(stage_type, &tuning, &mut rng);
                let grant = reward.open(choice, 0, &mut rng).unwrap();
                let RewardGrant::Points { points } = grant else {
                    panic!("expected points, got {grant:?}");
                };
                assert!(range.contains(points), "{stage_type}: {points}");
            }
        }
    }

    #[test]
    fn box_opens_only_once() {
        let tuning = RewardTuning::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut reward = RewardBox::for_stage(StageType::Normal, &tuning, &mut rng);
        assert_eq!(reward.choices(), 3);
        assert_eq!(
            reward.open(3, 0, &mut rng),
            Err(RewardError::ChoiceOutOfRange {
                choice: 3,
                choices: 3
            })
        );
        reward.open(1, 0, &mut rng).unwrap();
        assert!(reward.is_opened());
        assert_eq!(reward.open(0, 0, &mut rng), Err(RewardError::AlreadyOpened));
    }

    #[test]
    fn campfire_offers_distinct_catalogue_multipliers() {
        let tuning = RewardTuning::default();
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..50 {
            let reward = RewardBox::for_stage(StageType::Campfire, &tuning, &mut rng);
            let RewardKind::Multipliers { choices } = reward.kind() else {
                panic!("campfire must offer multipliers");
            };
            assert_eq!(choices.len(), 3);
            assert!(choices.iter().all(|m| tuning.campfire_multipliers.contains(m)));
            assert!(choices[0] != choices[1] && choices[1] != choices[2] && choices[0] != choices[2]);
        }
    }

    #[test]
    fn multiplier_floors_running_score() {
        let mut reward = RewardBox {
            stage_type: StageType::Campfire,
            kind: RewardKind::Multipliers {
                choices: SmallVec::from_slice(&[0.8, 1.5, 1.7]),
            },
            opened: None,
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let grant = reward.open(2, 333, &mut rng).unwrap();
        assert_eq!(
            grant,
            RewardGrant::Multiplied {
                multiplier: 1.7,
                before: 333,
                after: 566
            }
        );
        assert_eq!(grant.delta(), 233);
    }

    #[test]
    fn buffs_boost_and_expire() {
        let mut buffs = vec![
            TemporaryBuff::new(BuffEffect::PointBoost { percent: 50 }, 1),
            TemporaryBuff::new(BuffEffect::ExtraTime { seconds: 10 }, 2),
        ];
        assert_eq!(boosted_points(201, &buffs), 301);
        assert_eq!(extra_time(&buffs), 10);
        tick_buffs(&mut buffs);
        assert_eq!(buffs.len(), 1);
        assert_eq!(boosted_points(201, &buffs), 201);
        tick_buffs(&mut buffs);
        assert!(buffs.is_empty());
        assert_eq!(extra_time(&buffs), 0);
    }
}
