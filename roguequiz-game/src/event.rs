//! Commands emitted by the run state machine for outer layers to deliver.
//!
//! The session never performs I/O itself. Each transition that should reach an
//! external collaborator pushes a [`Command`] onto the session outbox, and the
//! engine drains it into the sinks after the transition has completed.

use serde::{Deserialize, Serialize};

use crate::answer::{Answer, AnswerInput};
use crate::stage::StageType;

/// How final the points on an activity record are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStatus {
    /// Points are settled.
    Final,
    /// Answer was correct; points are replaced once the reward box is opened.
    PendingReward,
    /// Part of an elite gauntlet still in progress; settled when it ends.
    Deferred,
}

/// Payload accepted by the activity-logging sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub question_index: usize,
    pub stage_type: StageType,
    pub answer: AnswerInput,
    pub is_correct: bool,
    pub points: i64,
    pub time_spent_secs: f64,
    pub scoring: ScoringStatus,
}

impl From<&Answer> for ActivityRecord {
    fn from(answer: &Answer) -> Self {
        Self {
            question_index: answer.question_index,
            stage_type: answer.stage_type,
            answer: answer.response.clone(),
            is_correct: answer.is_correct,
            points: answer.points,
            time_spent_secs: answer.time_spent_secs,
            scoring: answer.scoring,
        }
    }
}

/// Fire-and-forget work for external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    LogActivity(ActivityRecord),
    PublishScore { final_score: i64 },
}

impl Command {
    #[must_use]
    pub fn log(answer: &Answer) -> Self {
        Self::LogActivity(ActivityRecord::from(answer))
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LogActivity(_) => "log_activity",
            Self::PublishScore { .. } => "publish_score",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_record_serializes_with_scoring_tag() {
        let answer = Answer {
            question_index: 3,
            stage_type: StageType::Elite,
            response: AnswerInput::Choice(1),
            is_correct: true,
            points: 88,
            answered_at_ms: 1_200,
            time_spent_secs: 4.5,
            scoring: ScoringStatus::Deferred,
        };
        let json = serde_json::to_value(Command::log(&answer)).unwrap();
        assert_eq!(json["command"], "log_activity");
        assert_eq!(json["scoring"], "deferred");
        assert_eq!(json["stage_type"], "elite");
        assert_eq!(json["answer"]["kind"], "choice");
    }

    #[test]
    fn publish_score_is_tagged() {
        let json = serde_json::to_string(&Command::PublishScore { final_score: 1_250 }).unwrap();
        assert_eq!(json, r#"{"command":"publish_score","final_score":1250}"#);
        assert_eq!(Command::PublishScore { final_score: 0 }.kind(), "publish_score");
    }
}
