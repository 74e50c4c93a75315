#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod player_service;
pub mod question_source;
pub mod quiz;
pub mod session_store;

pub use app_services::AppServices;
pub use error::{AppServicesError, PlayerError, QuestionSourceError, QuizError, SessionStoreError};
pub use player_service::PlayerService;
pub use question_source::{
    OpenTdbSource, QuestionKind, QuestionSource, QuestionSourceConfig, fetch_or_empty,
};
pub use quiz::{
    QuizConfig, QuizController, QuizEvent, QuizOutcome, QuizPhase, ResultsRoute, ResultsView,
};
pub use session_store::SessionStore;
