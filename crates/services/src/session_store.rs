use std::sync::Arc;

use quiz_core::model::SessionState;
use storage::repository::KeyValueStore;

use crate::error::SessionStoreError;

/// Key of the persisted in-progress session.
pub const SESSION_KEY: &str = "quizSession";

/// Persists the in-progress quiz so it can be resumed after a restart.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Write `state` under the session key, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError` if serialization or storage fails.
    pub async fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(state)?;
        self.kv.set(SESSION_KEY, &json).await?;
        Ok(())
    }

    /// Read the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Malformed` or `SessionStoreError::Inconsistent`
    /// if a record exists but cannot be restored. No recovery is attempted.
    pub async fn load(&self) -> Result<Option<SessionState>, SessionStoreError> {
        let Some(json) = self.kv.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        let state: SessionState = serde_json::from_str(&json)?;
        state.validate()?;
        Ok(Some(state))
    }

    /// Erase the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` if the backend cannot be written.
    pub async fn clear(&self) -> Result<(), SessionStoreError> {
        self.kv.remove(SESSION_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionId, SessionStateError};
    use storage::repository::InMemoryStore;

    fn sample_state() -> SessionState {
        let questions = (0..3)
            .map(|i| {
                Question::new(
                    QuestionId::new(i),
                    format!("Question {i}?"),
                    "right",
                    vec!["right".into(), "wrong".into()],
                )
                .unwrap()
            })
            .collect();
        let mut state = SessionState::new(questions, 120).unwrap();
        state.record_answer("wrong").unwrap();
        state.tick();
        state
    }

    #[tokio::test]
    async fn save_then_load_is_identical() {
        let kv = InMemoryStore::new();
        let store = SessionStore::new(Arc::new(kv.clone()));
        let state = sample_state();

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap().expect("session present");
        assert_eq!(loaded, state);
        assert_eq!(loaded.current_index(), 1);
        assert_eq!(loaded.seconds_remaining(), 119);
    }

    #[tokio::test]
    async fn load_without_record_is_none() {
        let store = SessionStore::new(Arc::new(InMemoryStore::new()));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_record() {
        let kv = InMemoryStore::new();
        let store = SessionStore::new(Arc::new(kv.clone()));
        store.save(&sample_state()).await.unwrap();
        store.clear().await.unwrap();
        assert!(kv.get(SESSION_KEY).await.unwrap().is_none());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persisted_record_uses_expected_field_names() {
        let kv = InMemoryStore::new();
        let store = SessionStore::new(Arc::new(kv.clone()));
        store.save(&sample_state()).await.unwrap();

        let raw = kv.get(SESSION_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["questions"].is_array());
        assert_eq!(value["currentIndex"], 1);
        assert_eq!(value["timeLeft"], 119);
        assert_eq!(value["answers"][0]["selectedAnswer"], "wrong");
    }

    #[tokio::test]
    async fn malformed_record_fails_loudly() {
        let kv = InMemoryStore::new();
        kv.set(SESSION_KEY, "{not json").await.unwrap();
        let store = SessionStore::new(Arc::new(kv));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, SessionStoreError::Malformed(_)));
    }

    #[tokio::test]
    async fn inconsistent_record_fails_loudly() {
        let kv = InMemoryStore::new();
        kv.set(
            SESSION_KEY,
            r#"{"questions":[],"currentIndex":0,"answers":[],"timeLeft":10}"#,
        )
        .await
        .unwrap();
        let store = SessionStore::new(Arc::new(kv));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, SessionStoreError::Inconsistent(_)));
    }

    #[tokio::test]
    async fn record_with_answers_ahead_of_index_is_rejected() {
        let kv = InMemoryStore::new();
        let store = SessionStore::new(Arc::new(kv.clone()));
        let mut done = sample_state();
        done.record_answer("right").unwrap();
        done.record_answer("right").unwrap();
        store.save(&done).await.unwrap();

        let raw = kv.get(SESSION_KEY).await.unwrap().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value["currentIndex"] = serde_json::json!(0);
        kv.set(SESSION_KEY, &value.to_string()).await.unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(
            err,
            SessionStoreError::Inconsistent(SessionStateError::AnswerCountMismatch {
                answers: 3,
                index: 0
            })
        ));
    }
}
