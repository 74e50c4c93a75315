mod controller;
mod countdown;
mod results;

pub use controller::{
    DEFAULT_AMOUNT, DEFAULT_TIME_LIMIT_SECS, LOAD_FAILED_MESSAGE, QuizConfig, QuizController,
    QuizEvent, QuizOutcome, QuizPhase,
};
pub use countdown::{Countdown, Tick};
pub use results::{ResultsRoute, ResultsView};
