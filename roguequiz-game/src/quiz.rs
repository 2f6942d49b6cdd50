//! Quiz definitions consumed by the engine.
//!
//! Authoring and storage of quizzes live outside this crate; the engine only
//! reads the ordered question list and each question's kind-specific fields.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const SAMPLE_QUIZ: &str = include_str!("../assets/sample_quiz.json");

/// Discriminant of [`QuestionBody`], used to build question pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    ShortAnswer,
    Opinion,
}

impl QuestionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::ShortAnswer => "short-answer",
            Self::Opinion => "opinion",
        }
    }

    /// Whether answers of this kind can be wrong.
    #[must_use]
    pub const fn is_scored(self) -> bool {
        !matches!(self, Self::Opinion)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a short-answer response is compared with the accepted answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Exact,
    Contains,
}

/// Kind-specific question payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum QuestionBody {
    MultipleChoice {
        options: Vec<String>,
        correct_index: usize,
    },
    ShortAnswer {
        correct_text: String,
        #[serde(default)]
        match_type: MatchType,
        #[serde(default)]
        additional_answers: Vec<String>,
    },
    Opinion {
        #[serde(default)]
        options: Vec<String>,
        #[serde(default)]
        anonymous: bool,
    },
}

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    /// Per-question limit; the run's default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u32>,
    #[serde(flatten)]
    pub body: QuestionBody,
}

impl Question {
    #[must_use]
    pub const fn kind(&self) -> QuestionKind {
        match self.body {
            QuestionBody::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            QuestionBody::ShortAnswer { .. } => QuestionKind::ShortAnswer,
            QuestionBody::Opinion { .. } => QuestionKind::Opinion,
        }
    }

    pub fn multiple_choice(
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_index: usize,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            time_limit_secs: None,
            body: QuestionBody::MultipleChoice {
                options: options.into_iter().map(Into::into).collect(),
                correct_index,
            },
        }
    }

    pub fn short_answer(
        prompt: impl Into<String>,
        correct_text: impl Into<String>,
        match_type: MatchType,
        additional_answers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            time_limit_secs: None,
            body: QuestionBody::ShortAnswer {
                correct_text: correct_text.into(),
                match_type,
                additional_answers: additional_answers.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn opinion(
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            time_limit_secs: None,
            body: QuestionBody::Opinion {
                options: options.into_iter().map(Into::into).collect(),
                anonymous: false,
            },
        }
    }

    #[must_use]
    pub const fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("quiz JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question {index} has correct_index {correct_index} but only {options} options")]
    CorrectIndexOutOfRange {
        index: usize,
        correct_index: usize,
        options: usize,
    },
}

/// An ordered question list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Quiz {
    #[must_use]
    pub fn new(title: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            title: title.into(),
            questions,
        }
    }

    /// Parse and check a quiz from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a multiple-choice question
    /// points at a missing option.
    pub fn from_json(json: &str) -> Result<Self, QuizError> {
        let quiz: Self = serde_json::from_str(json)?;
        quiz.check()?;
        Ok(quiz)
    }

    /// Bundled sample quiz used by tests and the tester.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset is malformed.
    pub fn sample() -> Result<Self, QuizError> {
        Self::from_json(SAMPLE_QUIZ)
    }

    fn check(&self) -> Result<(), QuizError> {
        for (index, question) in self.questions.iter().enumerate() {
            if let QuestionBody::MultipleChoice {
                options,
                correct_index,
            } = &question.body
                && *correct_index >= options.len()
            {
                return Err(QuizError::CorrectIndexOutOfRange {
                    index,
                    correct_index: *correct_index,
                    options: options.len(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
