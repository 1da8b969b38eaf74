pub mod generator;

pub use generator::{AiQuestionGenerator, GeneratorConfig, QuestionGenerator};
