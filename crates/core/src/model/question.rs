use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt must not be empty")]
    EmptyPrompt,

    #[error("question needs at least two answer choices, got {len}")]
    TooFewChoices { len: usize },

    #[error("correct answer must appear exactly once among choices, found {occurrences}")]
    CorrectAnswerCount { occurrences: usize },
}

/// A multiple-choice question, immutable once built.
///
/// `choices` already holds the presentation order (shuffled by the question
/// source) and contains `correct_answer` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "question")]
    prompt: String,
    #[serde(rename = "correctAnswer")]
    correct_answer: String,
    #[serde(rename = "shuffledAnswers")]
    choices: Vec<String>,
}

impl Question {
    /// Build a question from already-ordered choices.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two choices are
    /// given, or the correct answer does not appear exactly once.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        correct_answer: impl Into<String>,
        choices: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            id,
            prompt: prompt.into(),
            correct_answer: correct_answer.into(),
            choices,
        };
        question.validate()?;
        Ok(question)
    }

    /// Check the construction invariants; used again after deserialization.
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.choices.len() < 2 {
            return Err(QuestionError::TooFewChoices {
                len: self.choices.len(),
            });
        }
        let occurrences = self
            .choices
            .iter()
            .filter(|choice| **choice == self.correct_answer)
            .count();
        if occurrences != 1 {
            return Err(QuestionError::CorrectAnswerCount { occurrences });
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn has_choice(&self, answer: &str) -> bool {
        self.choices.iter().any(|choice| choice == answer)
    }

    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

//
// ─── ANSWERED ENTRY ────────────────────────────────────────────────────────────
//

/// The answer recorded for one question. Appended once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredEntry {
    #[serde(rename = "questionId")]
    question_id: QuestionId,
    #[serde(rename = "question")]
    prompt: String,
    #[serde(rename = "selectedAnswer")]
    selected_answer: String,
}

impl AnsweredEntry {
    #[must_use]
    pub fn for_question(question: &Question, selected_answer: impl Into<String>) -> Self {
        Self {
            question_id: question.id(),
            prompt: question.prompt().to_owned(),
            selected_answer: selected_answer.into(),
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn selected_answer(&self) -> &str {
        &self.selected_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn builds_valid_question() {
        let q = Question::new(
            QuestionId::new(0),
            "Capital of France?",
            "Paris",
            choices(&["Lyon", "Paris", "Nice", "Lille"]),
        )
        .unwrap();

        assert_eq!(q.prompt(), "Capital of France?");
        assert!(q.has_choice("Nice"));
        assert!(!q.has_choice("Berlin"));
        assert!(q.is_correct("Paris"));
        assert!(!q.is_correct("Lyon"));
    }

    #[test]
    fn rejects_single_choice() {
        let err = Question::new(QuestionId::new(0), "Q", "A", choices(&["A"])).unwrap_err();
        assert_eq!(err, QuestionError::TooFewChoices { len: 1 });
    }

    #[test]
    fn rejects_missing_or_duplicated_correct_answer() {
        let missing =
            Question::new(QuestionId::new(0), "Q", "A", choices(&["B", "C"])).unwrap_err();
        assert_eq!(missing, QuestionError::CorrectAnswerCount { occurrences: 0 });

        let doubled =
            Question::new(QuestionId::new(0), "Q", "A", choices(&["A", "A", "B"])).unwrap_err();
        assert_eq!(doubled, QuestionError::CorrectAnswerCount { occurrences: 2 });
    }

    #[test]
    fn rejects_blank_prompt() {
        let err = Question::new(QuestionId::new(0), "  ", "A", choices(&["A", "B"])).unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let q = Question::new(QuestionId::new(2), "Q", "A", choices(&["B", "A"])).unwrap();
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["question"], "Q");
        assert_eq!(value["correctAnswer"], "A");
        assert_eq!(value["shuffledAnswers"][1], "A");

        let entry = AnsweredEntry::for_question(&q, "B");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["questionId"], 2);
        assert_eq!(value["question"], "Q");
        assert_eq!(value["selectedAnswer"], "B");
    }
}
