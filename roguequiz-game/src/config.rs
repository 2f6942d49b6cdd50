//! Run configuration: every product-tuning constant as a named, overridable value.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    ACTIVITY_COMPLETION_BONUS, CAMPFIRE_MULTIPLIERS, CAMPFIRE_RATIO, DEFAULT_ROUNDS,
    DEFAULT_TIME_LIMIT_SECS, DOUBLE_EDGE_PROBABILITY, ELITE_RATIO, ELITE_RESULT_DELAY_SECS,
    ELITE_REWARD_RANGE, FALLBACK_REWARD_RANGE, INCOMING_EDGE_PENALTY, MAX_ROUNDS, MIN_ROUNDS,
    NORMAL_RATIO, NORMAL_REWARD_RANGE, REWARD_BOX_CHOICES, ROULETTE_TICKET_COST,
};

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("rounds must be between {min} and {max} (got {value})")]
    Rounds {
        min: usize,
        max: usize,
        value: usize,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("stage mix ratios must sum to 1.0 (got {sum:.3})")]
    StageMixSum { sum: f64 },
    #[error("{field} range is inverted (min {min} > max {max})")]
    InvertedRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("campfire needs at least {needed} multipliers (got {got})")]
    TooFewMultipliers { needed: usize, got: usize },
    #[error("configuration JSON could not be parsed: {0}")]
    Parse(String),
}

/// Share of interior nodes allotted to each stage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMix {
    #[serde(default = "StageMix::default_normal")]
    pub normal: f64,
    #[serde(default = "StageMix::default_elite")]
    pub elite: f64,
    #[serde(default = "StageMix::default_campfire")]
    pub campfire: f64,
}

impl StageMix {
    const fn default_normal() -> f64 {
        NORMAL_RATIO
    }

    const fn default_elite() -> f64 {
        ELITE_RATIO
    }

    const fn default_campfire() -> f64 {
        CAMPFIRE_RATIO
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("stage_mix.normal", self.normal),
            ("stage_mix.elite", self.elite),
            ("stage_mix.campfire", self.campfire),
        ] {
            check_unit(field, value)?;
        }
        let sum = self.normal + self.elite + self.campfire;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::StageMixSum { sum });
        }
        Ok(())
    }
}

impl Default for StageMix {
    fn default() -> Self {
        Self {
            normal: Self::default_normal(),
            elite: Self::default_elite(),
            campfire: Self::default_campfire(),
        }
    }
}

/// Tuning for the greedy edge pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTuning {
    /// Chance a node asks for two outgoing edges instead of one.
    #[serde(default = "EdgeTuning::default_double_edge_probability")]
    pub double_edge_probability: f64,
    /// Distance penalty per incoming edge a candidate target already has.
    #[serde(default = "EdgeTuning::default_incoming_penalty")]
    pub incoming_penalty: f64,
}

impl EdgeTuning {
    const fn default_double_edge_probability() -> f64 {
        DOUBLE_EDGE_PROBABILITY
    }

    const fn default_incoming_penalty() -> f64 {
        INCOMING_EDGE_PENALTY
    }
}

impl Default for EdgeTuning {
    fn default() -> Self {
        Self {
            double_edge_probability: Self::default_double_edge_probability(),
            incoming_penalty: Self::default_incoming_penalty(),
        }
    }
}

/// Inclusive integer range for reward draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRange {
    pub min: i64,
    pub max: i64,
}

impl PointRange {
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn from_tuple(range: (i64, i64)) -> Self {
        Self::new(range.0, range.1)
    }

    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvertedRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Reward-box ranges keyed by stage type, plus the campfire multiplier catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTuning {
    #[serde(default = "RewardTuning::default_normal")]
    pub normal: PointRange,
    #[serde(default = "RewardTuning::default_elite")]
    pub elite: PointRange,
    #[serde(default = "RewardTuning::default_fallback")]
    pub fallback: PointRange,
    #[serde(default = "RewardTuning::default_campfire_multipliers")]
    pub campfire_multipliers: Vec<f64>,
}

impl RewardTuning {
    const fn default_normal() -> PointRange {
        PointRange::from_tuple(NORMAL_REWARD_RANGE)
    }

    const fn default_elite() -> PointRange {
        PointRange::from_tuple(ELITE_REWARD_RANGE)
    }

    const fn default_fallback() -> PointRange {
        PointRange::from_tuple(FALLBACK_REWARD_RANGE)
    }

    fn default_campfire_multipliers() -> Vec<f64> {
        CAMPFIRE_MULTIPLIERS.to_vec()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.normal.validate("rewards.normal")?;
        self.elite.validate("rewards.elite")?;
        self.fallback.validate("rewards.fallback")?;
        if self.campfire_multipliers.len() < REWARD_BOX_CHOICES {
            return Err(ConfigError::TooFewMultipliers {
                needed: REWARD_BOX_CHOICES,
                got: self.campfire_multipliers.len(),
            });
        }
        if self
            .campfire_multipliers
            .iter()
            .any(|m| !m.is_finite() || *m <= 0.0)
        {
            return Err(ConfigError::NotPositive {
                field: "rewards.campfire_multipliers",
            });
        }
        Ok(())
    }
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            normal: Self::default_normal(),
            elite: Self::default_elite(),
            fallback: Self::default_fallback(),
            campfire_multipliers: Self::default_campfire_multipliers(),
        }
    }
}

/// End-of-run roulette tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouletteTuning {
    #[serde(default = "RouletteTuning::default_ticket_cost")]
    pub ticket_cost: i64,
    #[serde(default = "RouletteTuning::default_completion_bonus")]
    pub completion_bonus: i64,
}

impl RouletteTuning {
    const fn default_ticket_cost() -> i64 {
        ROULETTE_TICKET_COST
    }

    const fn default_completion_bonus() -> i64 {
        ACTIVITY_COMPLETION_BONUS
    }
}

impl Default for RouletteTuning {
    fn default() -> Self {
        Self {
            ticket_cost: Self::default_ticket_cost(),
            completion_bonus: Self::default_completion_bonus(),
        }
    }
}

/// Full configuration for one roguelike run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Total rounds including the start and terminal rounds.
    #[serde(default = "RunConfig::default_rounds")]
    pub rounds: usize,
    /// Time limit for questions that carry none of their own.
    #[serde(default = "RunConfig::default_time_limit")]
    pub question_time_limit_secs: u32,
    #[serde(default)]
    pub stage_mix: StageMix,
    #[serde(default)]
    pub edges: EdgeTuning,
    #[serde(default)]
    pub rewards: RewardTuning,
    #[serde(default)]
    pub roulette: RouletteTuning,
    /// How long an elite answer's result stays on screen before moving on.
    #[serde(default = "RunConfig::default_elite_delay")]
    pub elite_result_delay_secs: f64,
    /// Make the terminal node a roulette stage instead of a plain end node.
    #[serde(default)]
    pub end_with_roulette: bool,
}

impl RunConfig {
    const fn default_rounds() -> usize {
        DEFAULT_ROUNDS
    }

    const fn default_time_limit() -> u32 {
        DEFAULT_TIME_LIMIT_SECS
    }

    const fn default_elite_delay() -> f64 {
        ELITE_RESULT_DELAY_SECS
    }

    /// Parse a configuration overlay; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[must_use]
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    /// Check every invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&self.rounds) {
            return Err(ConfigError::Rounds {
                min: MIN_ROUNDS,
                max: MAX_ROUNDS,
                value: self.rounds,
            });
        }
        if self.question_time_limit_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "question_time_limit_secs",
            });
        }
        self.stage_mix.validate()?;
        check_unit(
            "edges.double_edge_probability",
            self.edges.double_edge_probability,
        )?;
        if !self.edges.incoming_penalty.is_finite() || self.edges.incoming_penalty < 0.0 {
            return Err(ConfigError::NotPositive {
                field: "edges.incoming_penalty",
            });
        }
        self.rewards.validate()?;
        if self.roulette.ticket_cost <= 0 {
            return Err(ConfigError::NotPositive {
                field: "roulette.ticket_cost",
            });
        }
        if !self.elite_result_delay_secs.is_finite() || self.elite_result_delay_secs < 0.0 {
            return Err(ConfigError::NotPositive {
                field: "elite_result_delay_secs",
            });
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rounds: Self::default_rounds(),
            question_time_limit_secs: Self::default_time_limit(),
            stage_mix: StageMix::default(),
            edges: EdgeTuning::default(),
            rewards: RewardTuning::default(),
            roulette: RouletteTuning::default(),
            elite_result_delay_secs: Self::default_elite_delay(),
            end_with_roulette: false,
        }
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.rounds, 7);
        assert_eq!(cfg.rewards.normal, PointRange::new(80, 350));
        assert_eq!(cfg.rewards.elite, PointRange::new(250, 1_000));
        assert_eq!(cfg.rewards.campfire_multipliers.len(), 10);
    }

    #[test]
    fn empty_json_yields_defaults() {
        let cfg = RunConfig::from_json("{}").unwrap();
        assert_eq!(cfg, RunConfig::default());
    }

    #[test]
    fn partial_overlay_keeps_other_defaults() {
        let cfg = RunConfig::from_json(
            r#"{"rounds": 9, "rewards": {"normal": {"min": 10, "max": 20}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.rounds, 9);
        assert_eq!(cfg.rewards.normal, PointRange::new(10, 20));
        assert_eq!(cfg.rewards.elite, PointRange::new(250, 1_000));
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = RunConfig::default().with_rounds(2);
        assert!(matches!(cfg.validate(), Err(ConfigError::Rounds { .. })));

        let mut cfg = RunConfig::default();
        cfg.stage_mix.elite = 0.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::StageMixSum { .. })));

        let mut cfg = RunConfig::default();
        cfg.rewards.elite = PointRange::new(900, 100);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedRange {
                field: "rewards.elite",
                ..
            })
        ));

        let mut cfg = RunConfig::default();
        cfg.roulette.ticket_cost = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NotPositive { .. })));

        assert!(matches!(
            RunConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
