//! Stage records bound to map nodes.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::constants::ELITE_QUESTION_COUNT;

/// Kind of encounter a map node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageType {
    Start,
    Normal,
    Elite,
    Campfire,
    Roulette,
    End,
}

impl StageType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Normal => "normal",
            Self::Elite => "elite",
            Self::Campfire => "campfire",
            Self::Roulette => "roulette",
            Self::End => "end",
        }
    }

    /// Number of questions a stage of this type carries.
    #[must_use]
    pub const fn question_count(self) -> usize {
        match self {
            Self::Normal | Self::Campfire => 1,
            Self::Elite => ELITE_QUESTION_COUNT,
            Self::Start | Self::Roulette | Self::End => 0,
        }
    }

    /// Whether the node ends the run.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Roulette | Self::End)
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "normal" => Ok(Self::Normal),
            "elite" => Ok(Self::Elite),
            "campfire" => Ok(Self::Campfire),
            "roulette" => Ok(Self::Roulette),
            "end" => Ok(Self::End),
            _ => Err(()),
        }
    }
}

pub type QuestionIndices = SmallVec<[usize; ELITE_QUESTION_COUNT]>;

/// Gameplay unit owned by the map and looked up by node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub stage_type: StageType,
    pub question_indices: QuestionIndices,
    pub completed: bool,
    pub score: i64,
}

impl Stage {
    /// Build a stage; `question_indices` must match the type's question count.
    #[must_use]
    pub fn new(stage_type: StageType, question_indices: QuestionIndices) -> Self {
        debug_assert_eq!(question_indices.len(), stage_type.question_count());
        Self {
            stage_type,
            question_indices,
            completed: false,
            score: 0,
        }
    }

    /// A stage that carries no questions (start, roulette, end).
    #[must_use]
    pub fn empty(stage_type: StageType) -> Self {
        Self::new(stage_type, QuestionIndices::new())
    }

    /// First question of the stage, if it has one.
    #[must_use]
    pub fn first_question(&self) -> Option<usize> {
        self.question_indices.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn question_counts_follow_stage_type() {
        assert_eq!(StageType::Start.question_count(), 0);
        assert_eq!(StageType::Normal.question_count(), 1);
        assert_eq!(StageType::Campfire.question_count(), 1);
        assert_eq!(StageType::Elite.question_count(), 3);
        assert_eq!(StageType::Roulette.question_count(), 0);
    }

    #[test]
    fn stage_type_parses_and_displays() {
        for ty in [
            StageType::Start,
            StageType::Normal,
            StageType::Elite,
            StageType::Campfire,
            StageType::Roulette,
            StageType::End,
        ] {
            assert_eq!(ty.to_string().parse::<StageType>(), Ok(ty));
        }
        assert!("boss".parse::<StageType>().is_err());
    }

    #[test]
    fn new_stage_starts_incomplete() {
        let stage = Stage::new(StageType::Elite, smallvec![4, 5, 4]);
        assert!(!stage.completed);
        assert_eq!(stage.score, 0);
        assert_eq!(stage.first_question(), Some(4));
        assert!(Stage::empty(StageType::End).first_question().is_none());
    }
}
