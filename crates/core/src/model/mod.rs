mod ids;
mod question;
mod score;
mod session;

pub use ids::QuestionId;
pub use question::{AnsweredEntry, Question, QuestionError};
pub use score::ScoreSummary;
pub use session::{AnswerStep, SessionState, SessionStateError, TickStep};
