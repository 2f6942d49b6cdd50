//! Answer validation and time-decay scoring.
use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_QUESTION_POINTS, MIN_POINTS_RATIO, OPINION_POINTS, TIME_BONUS_FLOOR_RATIO,
};
use crate::event::ScoringStatus;
use crate::numbers::{floor_f64_to_i64, i64_to_f64, secs_to_f64};
use crate::quiz::{MatchType, Question, QuestionBody};
use crate::stage::StageType;

/// What the player submitted for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerInput {
    /// Option index for multiple-choice and opinion questions.
    Choice(usize),
    /// Free text for short-answer (or free-form opinion) questions.
    Text(String),
    /// The countdown ran out before anything was submitted.
    TimedOut,
}

impl AnswerInput {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Result of checking one input against one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_correct: bool,
    /// Candidate points; reward boxes decide what normal and elite stages grant.
    pub points: i64,
}

impl Verdict {
    const WRONG: Self = Self {
        is_correct: false,
        points: 0,
    };
}

/// Score `input` against `question` with `time_left_secs` of `time_limit_secs` remaining.
#[must_use]
pub fn validate(
    question: &Question,
    input: &AnswerInput,
    time_left_secs: f64,
    time_limit_secs: f64,
) -> Verdict {
    match &question.body {
        QuestionBody::Opinion { options, .. } => {
            if opinion_accepted(options, input) {
                Verdict {
                    is_correct: true,
                    points: OPINION_POINTS,
                }
            } else {
                Verdict::WRONG
            }
        }
        body => {
            if is_correct(body, input) {
                Verdict {
                    is_correct: true,
                    points: time_points(time_left_secs, time_limit_secs),
                }
            } else {
                Verdict::WRONG
            }
        }
    }
}

fn is_correct(body: &QuestionBody, input: &AnswerInput) -> bool {
    match (body, input) {
        (QuestionBody::MultipleChoice { correct_index, .. }, AnswerInput::Choice(chosen)) => {
            chosen == correct_index
        }
        (
            QuestionBody::ShortAnswer {
                correct_text,
                match_type,
                additional_answers,
            },
            AnswerInput::Text(text),
        ) => {
            let response = normalize(text);
            std::iter::once(correct_text)
                .chain(additional_answers.iter())
                .map(|accepted| normalize(accepted))
                .filter(|accepted| !accepted.is_empty())
                .any(|accepted| match match_type {
                    MatchType::Exact => response == accepted,
                    MatchType::Contains => response.contains(&accepted),
                })
        }
        _ => false,
    }
}

/// Any real response counts; a listed question only takes one of its options.
fn opinion_accepted(options: &[String], input: &AnswerInput) -> bool {
    match input {
        AnswerInput::Choice(chosen) => options.is_empty() || *chosen < options.len(),
        AnswerInput::Text(text) => !text.trim().is_empty(),
        AnswerInput::TimedOut => false,
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Time-decay points for a correct scored answer.
///
/// Half the base is guaranteed and the other half scales with the share of time
/// left; the result never drops below the minimum ratio of the base.
#[must_use]
pub fn time_points(time_left_secs: f64, time_limit_secs: f64) -> i64 {
    let base = i64_to_f64(BASE_QUESTION_POINTS);
    let floor = floor_f64_to_i64(base * MIN_POINTS_RATIO);
    if !time_left_secs.is_finite() || time_left_secs <= 0.0 || time_limit_secs <= 0.0 {
        return floor;
    }
    let ratio = (time_left_secs / time_limit_secs).clamp(0.0, 1.0);
    let scaled = base * (TIME_BONUS_FLOOR_RATIO + (1.0 - TIME_BONUS_FLOOR_RATIO) * ratio);
    floor_f64_to_i64(scaled).max(floor)
}

/// One entry of the run's answer log. Appended once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_index: usize,
    pub stage_type: StageType,
    pub response: AnswerInput,
    pub is_correct: bool,
    pub points: i64,
    /// Session clock at submission, in milliseconds since the run started.
    pub answered_at_ms: u64,
    pub time_spent_secs: f64,
    pub scoring: ScoringStatus,
}

impl Answer {
    /// Copy of this answer with a different scoring status and point value.
    #[must_use]
    pub fn rescored(&self, scoring: ScoringStatus, points: i64) -> Self {
        Self {
            scoring,
            points,
            ..self.clone()
        }
    }
}

/// Whole-second limit helper for questions without an explicit limit.
#[must_use]
pub fn effective_limit(question: &Question, default_secs: u32, extra_secs: u32) -> f64 {
    secs_to_f64(question.time_limit_secs.unwrap_or(default_secs).saturating_add(extra_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capital() -> Question {
        Question::short_answer("Capital of France?", "Paris", MatchType::Contains, ["france"])
    }

    #[test]
    fn time_points_follow_decay_curve() {
        assert_eq!(time_points(30.0, 30.0), 100);
        assert_eq!(time_points(0.0, 30.0), 30);
        assert_eq!(time_points(15.0, 30.0), 75);
        assert_eq!(time_points(-2.0, 30.0), 30);
        assert_eq!(time_points(45.0, 30.0), 100);
        assert_eq!(time_points(1.0, 30.0), 51);
    }

    #[test]
    fn multiple_choice_compares_index() {
        let q = Question::multiple_choice("2+2?", ["3", "4", "5"], 1);
        assert!(validate(&q, &AnswerInput::Choice(1), 30.0, 30.0).is_correct);
        let wrong = validate(&q, &AnswerInput::Choice(2), 30.0, 30.0);
        assert_eq!(wrong, Verdict::WRONG);
        assert!(!validate(&q, &AnswerInput::text("4"), 30.0, 30.0).is_correct);
    }

    #[test]
    fn contains_match_accepts_additional_answers() {
        let verdict = validate(&capital(), &AnswerInput::text("I went to france"), 30.0, 30.0);
        assert!(verdict.is_correct);
        assert_eq!(verdict.points, 100);
        assert!(validate(&capital(), &AnswerInput::text("  PARIS "), 10.0, 30.0).is_correct);
        assert!(!validate(&capital(), &AnswerInput::text("Lyon"), 10.0, 30.0).is_correct);
    }

    #[test]
    fn exact_match_requires_full_equality() {
        let q = Question::short_answer("Largest ocean?", "Pacific", MatchType::Exact, ["pacific ocean"]);
        assert!(validate(&q, &AnswerInput::text("pacific"), 5.0, 30.0).is_correct);
        assert!(validate(&q, &AnswerInput::text("Pacific Ocean "), 5.0, 30.0).is_correct);
        assert!(!validate(&q, &AnswerInput::text("the pacific"), 5.0, 30.0).is_correct);
    }

    #[test]
    fn opinion_pays_fixed_points() {
        let q = Question::opinion("Best season?", ["spring", "autumn"]);
        let verdict = validate(&q, &AnswerInput::Choice(0), 0.0, 30.0);
        assert_eq!(
            verdict,
            Verdict {
                is_correct: true,
                points: 50
            }
        );
        assert_eq!(validate(&q, &AnswerInput::text("   "), 10.0, 30.0), Verdict::WRONG);
        assert_eq!(validate(&q, &AnswerInput::TimedOut, 0.0, 30.0), Verdict::WRONG);
    }

    #[test]
    fn opinion_choice_must_name_an_option() {
        let listed = Question::opinion("Best season?", ["spring", "autumn"]);
        assert!(validate(&listed, &AnswerInput::Choice(1), 10.0, 30.0).is_correct);
        assert!(!validate(&listed, &AnswerInput::Choice(2), 10.0, 30.0).is_correct);

        let free_form = Question::opinion("Where next?", Vec::<String>::new());
        assert!(validate(&free_form, &AnswerInput::Choice(0), 10.0, 30.0).is_correct);
        assert!(validate(&free_form, &AnswerInput::text("Lisbon"), 10.0, 30.0).is_correct);
    }

    #[test]
    fn timed_out_is_never_correct() {
        let q = Question::multiple_choice("?", ["a", "b"], 0);
        assert!(!validate(&q, &AnswerInput::TimedOut, 0.0, 30.0).is_correct);
        assert!(AnswerInput::TimedOut.is_timed_out());
    }

    #[test]
    fn effective_limit_adds_extra_time() {
        let q = Question::multiple_choice("?", ["a", "b"], 0);
        assert!((effective_limit(&q, 30, 0) - 30.0).abs() < f64::EPSILON);
        let q = q.with_time_limit(20);
        assert!((effective_limit(&q, 30, 5) - 25.0).abs() < f64::EPSILON);
    }
}
