use std::sync::Arc;

use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::player_service::PlayerService;
use crate::question_source::{OpenTdbSource, QuestionSource, QuestionSourceConfig};
use crate::quiz::{QuizConfig, QuizController};
use crate::session_store::SessionStore;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    players: Arc<PlayerService>,
    sessions: SessionStore,
    source: Arc<dyn QuestionSource>,
    quiz_config: QuizConfig,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP question bank.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        source_config: QuestionSourceConfig,
        quiz_config: QuizConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source: Arc<dyn QuestionSource> = Arc::new(OpenTdbSource::new(source_config));
        Ok(Self::from_parts(&storage, source, quiz_config))
    }

    #[must_use]
    pub fn from_parts(
        storage: &Storage,
        source: Arc<dyn QuestionSource>,
        quiz_config: QuizConfig,
    ) -> Self {
        Self {
            players: Arc::new(PlayerService::new(Arc::clone(&storage.kv))),
            sessions: SessionStore::new(Arc::clone(&storage.kv)),
            source,
            quiz_config,
        }
    }

    #[must_use]
    pub fn players(&self) -> Arc<PlayerService> {
        Arc::clone(&self.players)
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn quiz_config(&self) -> QuizConfig {
        self.quiz_config
    }

    /// A fresh controller in the `Loading` phase.
    #[must_use]
    pub fn new_quiz(&self) -> QuizController {
        QuizController::new(
            Arc::clone(&self.source),
            self.sessions.clone(),
            self.quiz_config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuizPhase;
    use async_trait::async_trait;
    use quiz_core::model::Question;
    use storage::repository::KeyValueStore;

    use crate::error::QuestionSourceError;
    use crate::question_source::QuestionKind;

    struct NoQuestions;

    #[async_trait]
    impl QuestionSource for NoQuestions {
        async fn fetch_questions(
            &self,
            _amount: u32,
            _kind: QuestionKind,
        ) -> Result<Vec<Question>, QuestionSourceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn services_share_one_store() {
        let storage = Storage::in_memory();
        let services = AppServices::from_parts(&storage, Arc::new(NoQuestions), QuizConfig::default());

        services.players().login("Budi").await.unwrap();
        assert_eq!(
            storage.kv.get("quizUser").await.unwrap().as_deref(),
            Some("Budi")
        );

        let mut quiz = services.new_quiz();
        assert!(matches!(quiz.load().await.unwrap(), QuizPhase::Error(_)));
    }
}
