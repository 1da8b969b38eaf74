#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod config;
pub mod error;
pub mod identity;
pub mod questions;
pub mod sessions;

pub use assess_core::Clock;

pub use ai::{AiQuestionGenerator, GeneratorConfig, QuestionGenerator};
pub use app_services::AppServices;
pub use config::AssessmentConfig;
pub use error::{AppServicesError, ConfigError, GeneratorError, SessionError};
pub use identity::{IdentityProvider, StaticIdentity};
pub use questions::{QuestionResolver, ResolvedQuestions};

pub use sessions::{
    AssessmentService, AssessmentSession, AttemptHistoryService, AttemptListItem, PublicResult,
    QuestionStatus, SessionProgress, SessionStatus, SubmissionPhase, SubmitOutcome, SubmitTrigger,
};
