use std::fmt;

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use roguequiz_game::{
    AnswerInput, NodeId, Question, QuestionBody, RewardBox, RewardKind, RouletteEffect,
};
use serde::{Deserialize, Serialize};

/// Policy interface for automated play.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Index into `paths` of the node to move to.
    fn pick_path(&mut self, paths: &[NodeId]) -> usize;

    /// Seconds to "think" before answering a question with `limit_secs` on the clock.
    fn think_time(&mut self, limit_secs: f64) -> f64;

    fn answer(&mut self, question: &Question) -> AnswerInput;

    fn pick_reward(&mut self, reward: &RewardBox) -> usize;

    fn pick_roulette(&mut self, score: i64, offer: &[RouletteEffect]) -> usize;
}

/// Built-in autoplay strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplayStrategy {
    /// Answer everything correctly and greedily pick rewards
    Perfect,
    /// Seeded coin flips for every decision, including running out the clock
    Random,
    /// Answer everything wrong
    Careless,
}

impl GameplayStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Random => "random",
            Self::Careless => "careless",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Perfect => Box::new(PerfectPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Careless => Box::new(CarelessPolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The input that scores on `question`.
#[must_use]
pub fn correct_answer(question: &Question) -> AnswerInput {
    match &question.body {
        QuestionBody::MultipleChoice { correct_index, .. } => AnswerInput::Choice(*correct_index),
        QuestionBody::ShortAnswer { correct_text, .. } => AnswerInput::text(correct_text.clone()),
        QuestionBody::Opinion { .. } => AnswerInput::Choice(0),
    }
}

/// An input that never scores on `question` (opinions excepted).
#[must_use]
pub fn wrong_answer(question: &Question) -> AnswerInput {
    match &question.body {
        QuestionBody::MultipleChoice {
            options,
            correct_index,
        } => AnswerInput::Choice(if options.len() > 1 {
            (correct_index + 1) % options.len()
        } else {
            options.len()
        }),
        QuestionBody::ShortAnswer { .. } => AnswerInput::text(""),
        QuestionBody::Opinion { .. } => AnswerInput::Choice(0),
    }
}

fn best_multiplier(reward: &RewardBox) -> usize {
    match reward.kind() {
        RewardKind::Multipliers { choices } => choices
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(index, _)| index),
        RewardKind::Points { .. } => 0,
    }
}

struct PerfectPolicy;
struct CarelessPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x5EED_CAFE),
        }
    }
}

impl PlayerPolicy for PerfectPolicy {
    fn name(&self) -> &'static str {
        "perfect"
    }

    fn pick_path(&mut self, paths: &[NodeId]) -> usize {
        paths.len().saturating_sub(1)
    }

    fn think_time(&mut self, limit_secs: f64) -> f64 {
        (limit_secs * 0.1).min(2.0)
    }

    fn answer(&mut self, question: &Question) -> AnswerInput {
        correct_answer(question)
    }

    fn pick_reward(&mut self, reward: &RewardBox) -> usize {
        best_multiplier(reward)
    }

    fn pick_roulette(&mut self, score: i64, offer: &[RouletteEffect]) -> usize {
        offer
            .iter()
            .enumerate()
            .max_by_key(|(_, effect)| effect.apply(score).score_after)
            .map_or(0, |(index, _)| index)
    }
}

impl PlayerPolicy for CarelessPolicy {
    fn name(&self) -> &'static str {
        "careless"
    }

    fn pick_path(&mut self, _paths: &[NodeId]) -> usize {
        0
    }

    fn think_time(&mut self, _limit_secs: f64) -> f64 {
        1.0
    }

    fn answer(&mut self, question: &Question) -> AnswerInput {
        wrong_answer(question)
    }

    fn pick_reward(&mut self, _reward: &RewardBox) -> usize {
        0
    }

    fn pick_roulette(&mut self, _score: i64, _offer: &[RouletteEffect]) -> usize {
        0
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn pick_path(&mut self, paths: &[NodeId]) -> usize {
        if paths.is_empty() {
            0
        } else {
            self.rng.gen_range(0..paths.len())
        }
    }

    fn think_time(&mut self, limit_secs: f64) -> f64 {
        // Overshoots the limit now and then so timeouts get exercised.
        self.rng.gen_range(0.0..limit_secs.max(1.0) * 1.2)
    }

    fn answer(&mut self, question: &Question) -> AnswerInput {
        match &question.body {
            QuestionBody::MultipleChoice { options, .. } | QuestionBody::Opinion { options, .. }
                if !options.is_empty() =>
            {
                AnswerInput::Choice(self.rng.gen_range(0..options.len()))
            }
            QuestionBody::ShortAnswer { .. } if self.rng.gen_bool(0.5) => {
                correct_answer(question)
            }
            QuestionBody::ShortAnswer { .. } => AnswerInput::text("no idea"),
            _ => AnswerInput::text("pass"),
        }
    }

    fn pick_reward(&mut self, reward: &RewardBox) -> usize {
        self.rng.gen_range(0..reward.choices().max(1))
    }

    fn pick_roulette(&mut self, _score: i64, offer: &[RouletteEffect]) -> usize {
        if offer.is_empty() {
            0
        } else {
            self.rng.gen_range(0..offer.len())
        }
    }
}
