//! Three-question elite gauntlet.
//!
//! Phases run `Playing -> ShowingResult -> (MovingToNext -> Playing) | Completed`.
//! Any wrong or timed-out answer ends the gauntlet as failed once its result
//! has been shown; three correct answers end it as a success.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::answer::Answer;
use crate::constants::ELITE_QUESTION_COUNT;
use crate::stage::QuestionIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElitePhase {
    Playing,
    ShowingResult,
    MovingToNext,
    Completed,
}

impl fmt::Display for ElitePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Playing => "playing",
            Self::ShowingResult => "showing_result",
            Self::MovingToNext => "moving_to_next",
            Self::Completed => "completed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EliteError {
    #[error("gauntlet accepts answers only while playing, not while {0}")]
    NotPlaying(ElitePhase),
}

/// Reported to the session once the gauntlet completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteOutcome {
    pub success: bool,
    pub correct_count: usize,
    pub last_answer: Option<Answer>,
}

/// Observable progress from [`EliteGauntlet::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum EliteStep {
    /// The result display ended and the next question is about to start.
    MovingToNext,
    /// Question at this position in the gauntlet is now playing.
    NextQuestion { position: usize, question_index: usize },
    Finished(EliteOutcome),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteGauntlet {
    questions: QuestionIndices,
    position: usize,
    phase: ElitePhase,
    correct_count: usize,
    failed: bool,
    result_delay_secs: f64,
    result_remaining_secs: f64,
    last_answer: Option<Answer>,
}

impl EliteGauntlet {
    #[must_use]
    pub fn new(questions: QuestionIndices, result_delay_secs: f64) -> Self {
        debug_assert_eq!(questions.len(), ELITE_QUESTION_COUNT);
        Self {
            questions,
            position: 0,
            phase: ElitePhase::Playing,
            correct_count: 0,
            failed: false,
            result_delay_secs: result_delay_secs.max(0.0),
            result_remaining_secs: 0.0,
            last_answer: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> ElitePhase {
        self.phase
    }

    /// Zero-based position of the current question.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub const fn correct_count(&self) -> usize {
        self.correct_count
    }

    /// Quiz index of the question being played, if one is.
    #[must_use]
    pub fn current_question(&self) -> Option<usize> {
        match self.phase {
            ElitePhase::Playing => self.questions.get(self.position).copied(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.phase, ElitePhase::Completed)
    }

    /// Record the answer to the current question and start showing its result.
    /// A timed-out question arrives here as an incorrect answer.
    ///
    /// # Errors
    ///
    /// Returns [`EliteError::NotPlaying`] outside the playing phase.
    pub fn submit(&mut self, answer: Answer) -> Result<(), EliteError> {
        if self.phase != ElitePhase::Playing {
            return Err(EliteError::NotPlaying(self.phase));
        }
        if answer.is_correct {
            self.correct_count += 1;
        } else {
            self.failed = true;
        }
        log::debug!(
            "elite question {} of {} answered, correct={}",
            self.position + 1,
            self.questions.len(),
            answer.is_correct
        );
        self.last_answer = Some(answer);
        self.phase = ElitePhase::ShowingResult;
        self.result_remaining_secs = self.result_delay_secs;
        Ok(())
    }

    /// Advance the result display. Returns a step whenever the phase changes.
    pub fn tick(&mut self, dt_secs: f64) -> Option<EliteStep> {
        match self.phase {
            ElitePhase::Playing | ElitePhase::Completed => None,
            ElitePhase::ShowingResult => {
                if dt_secs.is_finite() && dt_secs > 0.0 {
                    self.result_remaining_secs -= dt_secs;
                }
                if self.result_remaining_secs > 0.0 {
                    return None;
                }
                if self.failed || self.position + 1 >= self.questions.len() {
                    self.phase = ElitePhase::Completed;
                    return Some(EliteStep::Finished(self.outcome()));
                }
                self.phase = ElitePhase::MovingToNext;
                Some(EliteStep::MovingToNext)
            }
            ElitePhase::MovingToNext => {
                self.position += 1;
                self.phase = ElitePhase::Playing;
                self.questions
                    .get(self.position)
                    .map(|&question_index| EliteStep::NextQuestion {
                        position: self.position,
                        question_index,
                    })
            }
        }
    }

    /// Outcome so far; final once the phase is `Completed`.
    #[must_use]
    pub fn outcome(&self) -> EliteOutcome {
        EliteOutcome {
            success: !self.failed && self.correct_count == self.questions.len(),
            correct_count: self.correct_count,
            last_answer: self.last_answer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::AnswerInput;
    use crate::event::ScoringStatus;
    use crate::stage::StageType;
    use smallvec::smallvec;

    fn answer(question_index: usize, is_correct: bool) -> Answer {
        Answer {
            question_index,
            stage_type: StageType::Elite,
            response: AnswerInput::Choice(0),
            is_correct,
            points: if is_correct { 90 } else { 0 },
            answered_at_ms: 0,
            time_spent_secs: 3.0,
            scoring: ScoringStatus::Deferred,
        }
    }

    /// Feed answers through the gauntlet, ticking past every result display.
    fn play(results: &[bool]) -> (EliteGauntlet, Option<EliteOutcome>) {
        let mut gauntlet = EliteGauntlet::new(smallvec![7, 8, 9], 1.5);
        let mut finished = None;
        for &correct in results {
            let Some(question) = gauntlet.current_question() else {
                break;
            };
            gauntlet.submit(answer(question, correct)).unwrap();
            assert_eq!(gauntlet.tick(1.0), None);
            match gauntlet.tick(0.5) {
                Some(EliteStep::Finished(outcome)) => finished = Some(outcome),
                Some(EliteStep::MovingToNext) => {
                    assert!(matches!(gauntlet.tick(0.0), Some(EliteStep::NextQuestion { .. })));
                }
                other => panic!("unexpected step {other:?}"),
            }
        }
        (gauntlet, finished)
    }

    #[test]
    fn wrong_third_answer_fails() {
        let (gauntlet, outcome) = play(&[true, true, false]);
        let outcome = outcome.unwrap();
        assert_eq!(gauntlet.phase(), ElitePhase::Completed);
        assert!(!outcome.success);
        assert_eq!(outcome.correct_count, 2);
        assert_eq!(outcome.last_answer.unwrap().question_index, 9);
    }

    #[test]
    fn three_correct_answers_succeed() {
        let (gauntlet, outcome) = play(&[true, true, true]);
        let outcome = outcome.unwrap();
        assert!(gauntlet.is_completed());
        assert!(outcome.success);
        assert_eq!(outcome.correct_count, 3);
    }

    #[test]
    fn first_wrong_answer_ends_immediately() {
        let (gauntlet, outcome) = play(&[false, true, true]);
        let outcome = outcome.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.correct_count, 0);
        assert_eq!(gauntlet.position(), 0);
    }

    #[test]
    fn rejects_answers_while_showing_result() {
        let mut gauntlet = EliteGauntlet::new(smallvec![1, 2, 3], 2.0);
        gauntlet.submit(answer(1, true)).unwrap();
        assert_eq!(
            gauntlet.submit(answer(1, true)),
            Err(EliteError::NotPlaying(ElitePhase::ShowingResult))
        );
        assert!(gauntlet.current_question().is_none());
    }

    #[test]
    fn zero_delay_resolves_on_next_tick() {
        let mut gauntlet = EliteGauntlet::new(smallvec![4, 5, 6], 0.0);
        gauntlet.submit(answer(4, true)).unwrap();
        assert_eq!(gauntlet.tick(0.0), Some(EliteStep::MovingToNext));
        assert_eq!(
            gauntlet.tick(0.0),
            Some(EliteStep::NextQuestion {
                position: 1,
                question_index: 5
            })
        );
        assert_eq!(gauntlet.current_question(), Some(5));
    }
}
