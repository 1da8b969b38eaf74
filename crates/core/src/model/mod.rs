mod attempt;
mod domain;
mod ids;
mod question;

pub use attempt::{Attempt, AttemptError, DomainScores, NewAttempt, Response};
pub use domain::{Difficulty, Domain, TagError};
pub use ids::{AttemptId, ParseIdError, QuestionId, ShareId, UserId};
pub use question::{
    OPTION_COUNT, OptionIndex, Question, QuestionDraft, QuestionError, QuestionKey,
    ValidatedQuestion,
};
