use quiz_core::model::ScoreSummary;

use super::controller::QuizOutcome;

/// Data for the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub username: String,
    pub score: ScoreSummary,
}

/// Where the results screen should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsRoute {
    Show(ResultsView),
    /// No finished quiz was handed over (stale or direct navigation).
    RedirectToLogin,
}

impl ResultsView {
    #[must_use]
    pub fn from_handoff(outcome: Option<&QuizOutcome>, username: Option<String>) -> ResultsRoute {
        let Some(outcome) = outcome else {
            return ResultsRoute::RedirectToLogin;
        };
        ResultsRoute::Show(Self {
            username: username.unwrap_or_default(),
            score: outcome.score(),
        })
    }
}
