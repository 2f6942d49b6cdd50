//! End-of-run activity bonus and ticket roulette.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{
    ACTIVITY_FAST_ANSWER_BONUS, ACTIVITY_FAST_ANSWER_SECS, ACTIVITY_OPINION_BONUS,
    ACTIVITY_POINTS_PER_CORRECT, ACTIVITY_POINTS_PER_STREAK, ROULETTE_CHOICES,
};
use crate::numbers::{floor_f64_to_i64, i64_to_f64};

/// Inputs to the activity bonus, taken from the session counters at completion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityBonus {
    pub correct_answers: u32,
    pub max_streak: u32,
    /// Mean seconds per answer; `None` when nothing was answered.
    pub average_answer_secs: Option<f64>,
    pub participated_in_opinion: bool,
    pub completion_bonus: i64,
}

impl ActivityBonus {
    #[must_use]
    pub fn total(&self) -> i64 {
        let fast = match self.average_answer_secs {
            Some(avg) if avg < ACTIVITY_FAST_ANSWER_SECS => ACTIVITY_FAST_ANSWER_BONUS,
            _ => 0,
        };
        let opinion = if self.participated_in_opinion {
            ACTIVITY_OPINION_BONUS
        } else {
            0
        };
        i64::from(self.correct_answers) * ACTIVITY_POINTS_PER_CORRECT
            + i64::from(self.max_streak) * ACTIVITY_POINTS_PER_STREAK
            + fast
            + opinion
            + self.completion_bonus
    }
}

/// Tickets bought by an activity bonus at `ticket_cost` each.
#[must_use]
pub fn ticket_count(activity_bonus: i64, ticket_cost: i64) -> u32 {
    if ticket_cost <= 0 || activity_bonus <= 0 {
        return 0;
    }
    u32::try_from(activity_bonus / ticket_cost).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouletteEffect {
    Boost,
    Trim,
    Double,
    Halve,
    Bonus,
    Penalty,
}

impl RouletteEffect {
    pub const ALL: [Self; 6] = [
        Self::Boost,
        Self::Trim,
        Self::Double,
        Self::Halve,
        Self::Bonus,
        Self::Penalty,
    ];

    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Boost => 1.5,
            Self::Trim => 0.8,
            Self::Double => 2.0,
            Self::Halve => 0.5,
            Self::Bonus | Self::Penalty => 1.0,
        }
    }

    #[must_use]
    pub const fn bonus_points(self) -> i64 {
        match self {
            Self::Bonus => 500,
            Self::Penalty => -300,
            _ => 0,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Boost => "x1.5",
            Self::Trim => "x0.8",
            Self::Double => "x2.0",
            Self::Halve => "x0.5",
            Self::Bonus => "+500",
            Self::Penalty => "-300",
        }
    }

    /// Apply the effect; the score never drops below zero.
    #[must_use]
    pub fn apply(self, score: i64) -> RouletteResult {
        let scaled = floor_f64_to_i64(i64_to_f64(score) * self.multiplier());
        let after = scaled.saturating_add(self.bonus_points()).max(0);
        RouletteResult {
            effect: self,
            multiplier: self.multiplier(),
            bonus_points: self.bonus_points(),
            message: format!("{} turned {score} into {after}", self.label()),
            score_before: score,
            score_after: after,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouletteResult {
    pub effect: RouletteEffect,
    pub multiplier: f64,
    pub bonus_points: i64,
    pub message: String,
    pub score_before: i64,
    pub score_after: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouletteError {
    #[error("no roulette tickets remain")]
    NoTickets,
    #[error("no roulette offer has been dealt")]
    NoOffer,
    #[error("choice {choice} is out of range; the offer has {choices} effects")]
    ChoiceOutOfRange { choice: usize, choices: usize },
}

pub type RouletteOffer = SmallVec<[RouletteEffect; ROULETTE_CHOICES]>;

/// Ticket-by-ticket roulette over a running score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouletteTable {
    score: i64,
    tickets: u32,
    offer: Option<RouletteOffer>,
    results: Vec<RouletteResult>,
}

impl RouletteTable {
    #[must_use]
    pub const fn new(score: i64, tickets: u32) -> Self {
        Self {
            score,
            tickets,
            offer: None,
            results: Vec::new(),
        }
    }

    #[must_use]
    pub const fn score(&self) -> i64 {
        self.score
    }

    #[must_use]
    pub const fn tickets_remaining(&self) -> u32 {
        self.tickets
    }

    #[must_use]
    pub fn offer(&self) -> Option<&[RouletteEffect]> {
        self.offer.as_deref()
    }

    #[must_use]
    pub fn results(&self) -> &[RouletteResult] {
        &self.results
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.tickets == 0
    }

    /// Deal a fresh triple of distinct effects for the next ticket.
    /// Keeps the current offer if one is already on the table.
    pub fn deal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&[RouletteEffect]> {
        if self.tickets == 0 {
            return None;
        }
        if self.offer.is_none() {
            let offer: RouletteOffer = RouletteEffect::ALL
                .choose_multiple(rng, ROULETTE_CHOICES)
                .copied()
                .collect();
            self.offer = Some(offer);
        }
        self.offer.as_deref()
    }

    /// Apply one effect of the current offer, consuming a ticket.
    ///
    /// # Errors
    ///
    /// Fails if no ticket remains, nothing has been dealt, or `choice` is out of range.
    pub fn select(&mut self, choice: usize) -> Result<RouletteResult, RouletteError> {
        if self.tickets == 0 {
            return Err(RouletteError::NoTickets);
        }
        let offer = self.offer.as_ref().ok_or(RouletteError::NoOffer)?;
        let effect = *offer.get(choice).ok_or(RouletteError::ChoiceOutOfRange {
            choice,
            choices: offer.len(),
        })?;
        let result = effect.apply(self.score);
        self.score = result.score_after;
        self.tickets -= 1;
        self.offer = None;
        self.results.push(result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn tickets_floor_bonus_by_cost() {
        assert_eq!(ticket_count(2_499, 500), 4);
        assert_eq!(ticket_count(2_500, 500), 5);
        assert_eq!(ticket_count(499, 500), 0);
        assert_eq!(ticket_count(-10, 500), 0);
        assert_eq!(ticket_count(1_000, 0), 0);
    }

    #[test]
    fn activity_bonus_sums_components() {
        let bonus = ActivityBonus {
            correct_answers: 10,
            max_streak: 5,
            average_answer_secs: Some(12.0),
            participated_in_opinion: true,
            completion_bonus: 300,
        };
        // 500 + 150 + 200 + 150 + 300
        assert_eq!(bonus.total(), 1_300);

        let slow = ActivityBonus {
            average_answer_secs: Some(30.0),
            participated_in_opinion: false,
            ..bonus
        };
        assert_eq!(slow.total(), 950);

        let idle = ActivityBonus {
            completion_bonus: 300,
            ..ActivityBonus::default()
        };
        assert_eq!(idle.total(), 300);
    }

    #[test]
    fn effects_apply_and_floor_at_zero() {
        assert_eq!(RouletteEffect::Boost.apply(1_001).score_after, 1_501);
        assert_eq!(RouletteEffect::Trim.apply(1_000).score_after, 800);
        assert_eq!(RouletteEffect::Double.apply(700).score_after, 1_400);
        assert_eq!(RouletteEffect::Halve.apply(701).score_after, 350);
        assert_eq!(RouletteEffect::Bonus.apply(0).score_after, 500);
        assert_eq!(RouletteEffect::Penalty.apply(200).score_after, 0);
        let result = RouletteEffect::Penalty.apply(1_000);
        assert_eq!(result.bonus_points, -300);
        assert_eq!(result.score_after, 700);
    }

    #[test]
    fn table_consumes_one_ticket_per_selection() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut table = RouletteTable::new(1_000, 2);
        assert_eq!(table.select(0), Err(RouletteError::NoOffer));

        let offer = table.deal(&mut rng).unwrap().to_vec();
        assert_eq!(offer.len(), 3);
        assert!(offer[0] != offer[1] && offer[1] != offer[2] && offer[0] != offer[2]);
        assert_eq!(table.deal(&mut rng).unwrap(), offer.as_slice());

        let first = table.select(1).unwrap();
        assert_eq!(first.effect, offer[1]);
        assert_eq!(table.tickets_remaining(), 1);
        assert!(table.offer().is_none());

        table.deal(&mut rng);
        let second = table.select(0).unwrap();
        assert_eq!(second.score_before, first.score_after);
        assert!(table.is_finished());
        assert_eq!(table.score(), second.score_after);
        assert_eq!(table.results().len(), 2);
        assert!(table.deal(&mut rng).is_none());
        assert_eq!(table.select(0), Err(RouletteError::NoTickets));
    }
}
