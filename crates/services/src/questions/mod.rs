//! Question sourcing for assessment sessions.

mod bank;
mod resolver;
mod seed;
mod sources;

pub use bank::template_drafts;
pub use resolver::{QuestionResolver, ResolvedQuestions};
pub use seed::{SeedReport, seed_questions};
pub use sources::{Candidate, GeneratedSource, QuestionSource, StoreSource, TemplateSource};
