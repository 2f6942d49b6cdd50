//! Centralized balance and tuning constants for the roguelike quiz engine.
//!
//! These values are the defaults behind [`crate::config::RunConfig`]. Keeping
//! them together means the tuning math only changes through reviewed code,
//! while a run can still override them through its configuration.

// Map shape ----------------------------------------------------------------
pub const DEFAULT_ROUNDS: usize = 7;
pub const MIN_ROUNDS: usize = 3;
pub const MAX_ROUNDS: usize = 12;
/// Interior rounds needed before an available stage type is guaranteed a slot.
pub const FORCED_SLOT_MIN_INTERIOR_ROUNDS: usize = 3;
pub const MAX_FAN_OUT: usize = 2;

// Stage mix ----------------------------------------------------------------
pub const NORMAL_RATIO: f64 = 0.60;
pub const ELITE_RATIO: f64 = 0.25;
pub const CAMPFIRE_RATIO: f64 = 0.15;
pub const ELITE_QUESTION_COUNT: usize = 3;

// Edge construction ----------------------------------------------------------
pub const DOUBLE_EDGE_PROBABILITY: f64 = 0.3;
/// Horizontal distance (layout units) charged per existing incoming edge.
pub const INCOMING_EDGE_PENALTY: f64 = 60.0;

// Node placement -------------------------------------------------------------
pub const MAP_WIDTH: f64 = 800.0;
pub const ROUND_SPACING: f64 = 140.0;
pub const WAVE_AMPLITUDE: f64 = 24.0;
pub const WAVE_FREQUENCY: f64 = 0.9;
/// Jitter is bounded by this share of the slot width so x-order survives.
pub const JITTER_SLOT_SHARE: f64 = 0.2;
pub const SPREAD_FACTOR: f64 = 0.15;
pub const VERTICAL_JITTER: f64 = 18.0;

// Answer scoring -------------------------------------------------------------
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;
pub const BASE_QUESTION_POINTS: i64 = 100;
pub const MIN_POINTS_RATIO: f64 = 0.3;
pub const TIME_BONUS_FLOOR_RATIO: f64 = 0.5;
pub const OPINION_POINTS: i64 = 50;
pub const ELITE_RESULT_DELAY_SECS: f64 = 1.5;

// Reward boxes ---------------------------------------------------------------
pub const REWARD_BOX_CHOICES: usize = 3;
pub const NORMAL_REWARD_RANGE: (i64, i64) = (80, 350);
pub const ELITE_REWARD_RANGE: (i64, i64) = (250, 1_000);
pub const FALLBACK_REWARD_RANGE: (i64, i64) = (30, 180);
pub const CAMPFIRE_MULTIPLIERS: [f64; 10] = [0.8, 0.9, 1.0, 1.1, 1.2, 1.3, 1.5, 1.7, 1.8, 2.0];

// Roulette -------------------------------------------------------------------
pub const ROULETTE_TICKET_COST: i64 = 500;
pub const ROULETTE_CHOICES: usize = 3;
pub const ACTIVITY_POINTS_PER_CORRECT: i64 = 50;
pub const ACTIVITY_POINTS_PER_STREAK: i64 = 30;
pub const ACTIVITY_FAST_ANSWER_BONUS: i64 = 200;
pub const ACTIVITY_FAST_ANSWER_SECS: f64 = 30.0;
pub const ACTIVITY_OPINION_BONUS: i64 = 150;
pub const ACTIVITY_COMPLETION_BONUS: i64 = 300;
