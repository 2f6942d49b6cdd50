//! Question pools partitioned by question kind.
use serde::{Deserialize, Serialize};

use crate::quiz::{QuestionKind, Quiz};

/// Index pools computed once from a quiz; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionPools {
    multiple_choice: Vec<usize>,
    short_answer: Vec<usize>,
    opinion: Vec<usize>,
}

impl QuestionPools {
    /// Partition the quiz's question indices by kind, preserving quiz order.
    #[must_use]
    pub fn index(quiz: &Quiz) -> Self {
        let mut pools = Self::default();
        for (idx, question) in quiz.questions.iter().enumerate() {
            match question.kind() {
                QuestionKind::MultipleChoice => pools.multiple_choice.push(idx),
                QuestionKind::ShortAnswer => pools.short_answer.push(idx),
                QuestionKind::Opinion => pools.opinion.push(idx),
            }
        }
        pools
    }

    #[must_use]
    pub fn pool(&self, kind: QuestionKind) -> &[usize] {
        match kind {
            QuestionKind::MultipleChoice => &self.multiple_choice,
            QuestionKind::ShortAnswer => &self.short_answer,
            QuestionKind::Opinion => &self.opinion,
        }
    }

    /// Union of the multiple-choice and short-answer pools, in quiz order.
    ///
    /// Normal and elite stages draw from this pool; with no short-answer
    /// questions it is exactly the multiple-choice pool.
    #[must_use]
    pub fn scored(&self) -> Vec<usize> {
        let mut union: Vec<usize> = self
            .multiple_choice
            .iter()
            .chain(self.short_answer.iter())
            .copied()
            .collect();
        union.sort_unstable();
        union
    }

    #[must_use]
    pub fn opinion(&self) -> &[usize] {
        &self.opinion
    }

    #[must_use]
    pub fn has_scored(&self) -> bool {
        !self.multiple_choice.is_empty() || !self.short_answer.is_empty()
    }

    #[must_use]
    pub fn has_opinion(&self) -> bool {
        !self.opinion.is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_scored() && !self.has_opinion()
    }
}
