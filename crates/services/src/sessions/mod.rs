mod countdown;
mod guard;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use countdown::{Countdown, CountdownState, Tick};
pub use guard::{SubmissionGuard, SubmissionPhase};
pub use progress::{QuestionStatus, SessionProgress};
pub use service::{AssessmentSession, SessionStatus, SubmitOutcome, SubmitTrigger};
pub use view::{AttemptHistoryService, AttemptListItem, PublicResult};
pub use workflow::AssessmentService;
