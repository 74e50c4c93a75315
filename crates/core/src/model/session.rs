use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnsweredEntry, Question, QuestionError, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("session has no questions")]
    Empty,

    #[error("session already finished")]
    Finished,

    #[error("answer is not one of the current choices: {answer}")]
    UnknownChoice { answer: String },

    #[error("current index {index} is past the question count {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{answers} answers recorded for {len} questions")]
    TooManyAnswers { answers: usize, len: usize },

    #[error("{answers} answers recorded but current index is {index}")]
    AnswerCountMismatch { answers: usize, index: usize },

    #[error("question id {id} appears more than once")]
    DuplicateQuestionId { id: QuestionId },

    #[error("answer {position} refers to question {id}, which is not the question at that position")]
    AnswerQuestionMismatch { position: usize, id: QuestionId },

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// What happened after recording an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStep {
    /// Moved on to the question at `index`.
    Advanced { index: usize },
    /// The last question was answered; the session is finished.
    Completed,
}

/// What happened after one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStep {
    Ticked { remaining: u32 },
    /// The clock ran out; the session is finished.
    Expired,
    /// Finished sessions ignore ticks.
    Ignored,
}

/// In-progress quiz state: question set, position, recorded answers and clock.
///
/// Serializes to the persisted record `{questions, currentIndex, answers, timeLeft}`;
/// the `finished` flag is never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    questions: Vec<Question>,
    #[serde(rename = "currentIndex")]
    current_index: usize,
    answers: Vec<AnsweredEntry>,
    #[serde(rename = "timeLeft")]
    seconds_remaining: u32,
    #[serde(skip)]
    finished: bool,
}

impl SessionState {
    /// Start a fresh session at the first question with the full time limit.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Empty` if `questions` is empty.
    pub fn new(questions: Vec<Question>, time_limit_secs: u32) -> Result<Self, SessionStateError> {
        if questions.is_empty() {
            return Err(SessionStateError::Empty);
        }
        Ok(Self {
            questions,
            current_index: 0,
            answers: Vec::new(),
            seconds_remaining: time_limit_secs,
            finished: false,
        })
    }

    /// Check invariants of a state rehydrated from storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` describing the first violated invariant.
    pub fn validate(&self) -> Result<(), SessionStateError> {
        if self.questions.is_empty() {
            return Err(SessionStateError::Empty);
        }
        let len = self.questions.len();
        if self.current_index > len {
            return Err(SessionStateError::IndexOutOfRange {
                index: self.current_index,
                len,
            });
        }
        if self.answers.len() > len {
            return Err(SessionStateError::TooManyAnswers {
                answers: self.answers.len(),
                len,
            });
        }
        // The last answer completes the session without moving the index.
        let answered = self.answers.len();
        let fully_answered = answered == len && self.current_index + 1 >= len;
        if answered != self.current_index && !fully_answered {
            return Err(SessionStateError::AnswerCountMismatch {
                answers: answered,
                index: self.current_index,
            });
        }

        let mut seen = HashSet::with_capacity(len);
        for question in &self.questions {
            question.validate()?;
            if !seen.insert(question.id()) {
                return Err(SessionStateError::DuplicateQuestionId { id: question.id() });
            }
        }

        // Answers are appended in question order.
        for (position, (answer, question)) in self.answers.iter().zip(&self.questions).enumerate() {
            if answer.question_id() != question.id() {
                return Err(SessionStateError::AnswerQuestionMismatch {
                    position,
                    id: answer.question_id(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[AnsweredEntry] {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True when there is nothing left to play: clock at zero, past the last
    /// question, or every question already answered.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        let len = self.questions.len();
        self.seconds_remaining == 0 || self.current_index >= len || self.answers.len() >= len
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.finished {
            return None;
        }
        self.questions.get(self.current_index)
    }

    /// Record `selected` for the current question and advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Finished` once the session is over, or
    /// `SessionStateError::UnknownChoice` if `selected` is not offered by the
    /// current question.
    pub fn record_answer(&mut self, selected: &str) -> Result<AnswerStep, SessionStateError> {
        let Some(question) = self.current_question() else {
            return Err(SessionStateError::Finished);
        };
        if !question.has_choice(selected) {
            return Err(SessionStateError::UnknownChoice {
                answer: selected.to_owned(),
            });
        }

        let entry = AnsweredEntry::for_question(question, selected);
        self.answers.push(entry);

        if self.current_index + 1 >= self.questions.len() {
            self.finished = true;
            return Ok(AnswerStep::Completed);
        }
        self.current_index += 1;
        Ok(AnswerStep::Advanced {
            index: self.current_index,
        })
    }

    /// Advance the clock by one second.
    pub fn tick(&mut self) -> TickStep {
        if self.finished {
            return TickStep::Ignored;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.finished = true;
            return TickStep::Expired;
        }
        TickStep::Ticked {
            remaining: self.seconds_remaining,
        }
    }

    /// Mark the session finished without further changes.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Split into the `(questions, answers)` pair handed to scoring.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Question>, Vec<AnsweredEntry>) {
        (self.questions, self.answers)
    }
}
