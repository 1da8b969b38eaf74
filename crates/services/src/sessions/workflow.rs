use std::sync::Arc;

use storage::repository::AttemptRepository;
use tracing::{info, warn};

use super::service::{AssessmentSession, SessionDeps};
use crate::Clock;
use crate::config::AssessmentConfig;
use crate::error::SessionError;
use crate::identity::IdentityProvider;
use crate::questions::QuestionResolver;

/// Starts assessment sessions for the signed-in user.
#[derive(Clone)]
pub struct AssessmentService {
    clock: Clock,
    config: AssessmentConfig,
    identity: Arc<dyn IdentityProvider>,
    resolver: Arc<QuestionResolver>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AssessmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: AssessmentConfig,
        identity: Arc<dyn IdentityProvider>,
        resolver: QuestionResolver,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            config,
            identity,
            resolver: Arc::new(resolver),
            attempts,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// Resolve a question set and start a timed session over it.
    ///
    /// Dropping the returned future before it completes cancels resolution;
    /// no session or countdown exists until it resolves.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotAuthenticated` if nobody is signed in or the store
    ///   rejects the credentials.
    /// - `SessionError::NoQuestionsAvailable` if too few questions could be found.
    pub async fn start_session(&self) -> Result<AssessmentSession, SessionError> {
        let user_id = self
            .identity
            .current_user()
            .await
            .ok_or(SessionError::NotAuthenticated)?;

        let resolved = self
            .resolver
            .resolve(self.config.question_count, self.config.min_questions)
            .await?;
        if resolved.is_partial() {
            warn!(
                dropped = resolved.dropped,
                "some generated questions could not be saved"
            );
        }
        info!(
            user_id = %user_id,
            questions = resolved.questions.len(),
            rejected = resolved.rejected,
            sources = ?resolved.sources_used,
            "assessment started"
        );

        AssessmentSession::start(
            resolved.questions,
            self.config.duration_secs(),
            self.config.tick_period,
            resolved.dropped,
            SessionDeps {
                user_id,
                identity: Arc::clone(&self.identity),
                attempts: Arc::clone(&self.attempts),
                clock: self.clock,
            },
        )
    }
}
