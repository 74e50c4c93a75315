use std::collections::HashMap;

use crate::model::{AnsweredEntry, Question, QuestionId};

/// Aggregate result of a finished quiz. Derived on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreSummary {
    pub correct: usize,
    pub incorrect: usize,
    pub answered: usize,
    pub total: usize,
}

impl ScoreSummary {
    /// Score `answers` against `questions`.
    ///
    /// Each answer is matched to its question by `QuestionId`; an answer whose
    /// question cannot be found counts as incorrect.
    #[must_use]
    pub fn compute(questions: &[Question], answers: &[AnsweredEntry]) -> Self {
        let mut by_id: HashMap<QuestionId, &Question> = HashMap::with_capacity(questions.len());
        for question in questions {
            // first occurrence wins
            by_id.entry(question.id()).or_insert(question);
        }

        let correct = answers
            .iter()
            .filter(|answer| {
                by_id
                    .get(&answer.question_id())
                    .is_some_and(|q| q.is_correct(answer.selected_answer()))
            })
            .count();
        let answered = answers.len();

        Self {
            correct,
            incorrect: answered - correct,
            answered,
            total: questions.len(),
        }
    }
}
