#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{Question, QuestionId};
use services::{
    QuestionKind, QuestionSource, QuestionSourceError, QuizConfig, QuizController, SessionStore,
};
use storage::repository::InMemoryStore;

pub const RIGHT: &str = "right";
pub const WRONG: &str = "wrong";

pub fn questions(n: u64) -> Vec<Question> {
    (0..n)
        .map(|i| {
            Question::new(
                QuestionId::new(i),
                format!("Question {i}?"),
                RIGHT,
                vec![WRONG.into(), "other".into(), RIGHT.into(), "none".into()],
            )
            .unwrap()
        })
        .collect()
}

/// Question source returning a fixed set, or failing like an HTTP 503.
pub struct StaticSource {
    questions: Vec<Question>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn with(questions: Vec<Question>) -> Arc<Self> {
        Arc::new(Self {
            questions,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            questions: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSource for StaticSource {
    async fn fetch_questions(
        &self,
        amount: u32,
        _kind: QuestionKind,
    ) -> Result<Vec<Question>, QuestionSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(QuestionSourceError::HttpStatus(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }
        Ok(self
            .questions
            .iter()
            .take(amount as usize)
            .cloned()
            .collect())
    }
}

pub fn controller(
    source: Arc<StaticSource>,
    kv: &InMemoryStore,
    config: QuizConfig,
) -> QuizController {
    QuizController::new(source, SessionStore::new(Arc::new(kv.clone())), config)
}
