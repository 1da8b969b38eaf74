//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `AiQuestionGenerator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("question generator is not configured")]
    Disabled,
    #[error("question generator returned an empty response")]
    EmptyResponse,
    #[error("question generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("question generator returned malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while reading configuration from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Errors emitted by assessment sessions and the services that start them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// No identity was available, or the backend rejected it while loading questions.
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("no questions available for assessment")]
    NoQuestionsAvailable,
    /// Scoring succeeded but the attempt could not be stored. The session stays retryable.
    #[error("failed to persist attempt: {0}")]
    PersistenceFailure(#[source] StorageError),
    /// Identity expired or changed between start and submit. The session is over.
    #[error("session expired before the attempt could be saved")]
    SessionExpiredMidFlight,
    #[error("session closed")]
    Closed,
    #[error("session already completed")]
    Completed,
    #[error("question index {index} out of range (0..{len})")]
    InvalidIndex { index: usize, len: usize },
    #[error("option {0} out of range")]
    InvalidOption(u8),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
