//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::SessionStateError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `QuestionSource`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("question bank request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid question bank endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Errors emitted by `SessionStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionStoreError {
    #[error("persisted session is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("persisted session is inconsistent: {0}")]
    Inconsistent(#[from] SessionStateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PlayerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("name must not be empty")]
    EmptyName,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz is not accepting answers")]
    NotAnswering,
    #[error(transparent)]
    Session(#[from] SessionStateError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
