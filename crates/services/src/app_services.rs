use std::sync::Arc;

use storage::repository::{Storage, StorageError};

use crate::Clock;
use crate::ai::{AiQuestionGenerator, QuestionGenerator};
use crate::config::AssessmentConfig;
use crate::error::AppServicesError;
use crate::identity::IdentityProvider;
use crate::questions::{QuestionResolver, SeedReport, seed_questions, template_drafts};
use crate::sessions::{AssessmentService, AttemptHistoryService};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    assessment: Arc<AssessmentService>,
    history: Arc<AttemptHistoryService>,
    generator_enabled: bool,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with the generator read from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: AssessmentConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, clock).await?;
        let generator = AiQuestionGenerator::from_env();
        let generator: Option<Arc<dyn QuestionGenerator>> = generator
            .enabled()
            .then(|| Arc::new(generator) as Arc<dyn QuestionGenerator>);
        Ok(Self::from_storage(storage, clock, config, identity, generator))
    }

    /// Build services over an existing `Storage`.
    #[must_use]
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        config: AssessmentConfig,
        identity: Arc<dyn IdentityProvider>,
        generator: Option<Arc<dyn QuestionGenerator>>,
    ) -> Self {
        let generator_enabled = generator.is_some();
        let resolver = QuestionResolver::standard(
            Arc::clone(&storage.questions),
            generator,
            config.store_pool,
        );
        let assessment = Arc::new(AssessmentService::new(
            clock,
            config,
            identity,
            resolver,
            Arc::clone(&storage.attempts),
        ));
        let history = Arc::new(AttemptHistoryService::new(Arc::clone(&storage.attempts)));

        Self {
            storage,
            assessment,
            history,
            generator_enabled,
        }
    }

    #[must_use]
    pub fn assessment(&self) -> Arc<AssessmentService> {
        Arc::clone(&self.assessment)
    }

    #[must_use]
    pub fn history(&self) -> Arc<AttemptHistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn generator_enabled(&self) -> bool {
        self.generator_enabled
    }

    /// Insert the built-in question bank into storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repository fails.
    pub async fn seed_templates(&self) -> Result<SeedReport, StorageError> {
        seed_questions(self.storage.questions.as_ref(), template_drafts()).await
    }
}
