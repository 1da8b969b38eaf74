use assess_core::model::{
    Attempt, AttemptId, NewAttempt, Question, QuestionId, QuestionKey, Response, ShareId, UserId,
    ValidatedQuestion,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    /// The caller's session or credentials were rejected by the backend.
    #[error("session or credentials expired")]
    CredentialExpired,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    #[must_use]
    pub fn is_credential_expired(&self) -> bool {
        matches!(self, StorageError::CredentialExpired)
    }
}

/// Repository contract for the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// List up to `limit` stored questions. Order is backend-defined; callers sample.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions(&self, limit: u32) -> Result<Vec<Question>, StorageError>;

    /// Look up a question by its normalized text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_question_by_key(
        &self,
        key: &QuestionKey,
    ) -> Result<Option<Question>, StorageError>;

    /// Insert a question, or return the stored one if its normalized text already exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError>;
}

/// Repository contract for attempts and their responses.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Store an attempt and assign its id and share id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn create_attempt(&self, attempt: &NewAttempt) -> Result<Attempt, StorageError>;

    /// Attach responses to an existing attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the attempt or a question is missing.
    async fn insert_responses(
        &self,
        attempt_id: AttemptId,
        responses: &[Response],
    ) -> Result<(), StorageError>;

    /// Store an attempt together with its responses, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any part fails; nothing is stored in that case.
    async fn record_attempt(
        &self,
        attempt: &NewAttempt,
        responses: &[Response],
    ) -> Result<Attempt, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<Attempt, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_by_share_id(&self, share_id: ShareId) -> Result<Option<Attempt>, StorageError>;

    /// Attempts of one user, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Attempt>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_responses(&self, attempt_id: AttemptId) -> Result<Vec<Response>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    questions: Vec<Question>,
    by_key: HashMap<QuestionKey, QuestionId>,
    attempts: Vec<Attempt>,
    responses: HashMap<AttemptId, Vec<Response>>,
    next_question_id: u64,
    next_attempt_id: u64,
}

impl MemoryState {
    fn insert_question(&mut self, question: ValidatedQuestion) -> Question {
        let key = question.key();
        if let Some(existing) = self
            .by_key
            .get(&key)
            .and_then(|id| self.questions.iter().find(|q| q.id == *id))
        {
            return existing.clone();
        }
        self.next_question_id += 1;
        let stored = question.assign_id(QuestionId::new(self.next_question_id));
        self.by_key.insert(key, stored.id);
        self.questions.push(stored.clone());
        stored
    }

    fn create_attempt(&mut self, attempt: &NewAttempt) -> Attempt {
        self.next_attempt_id += 1;
        let stored = Attempt::created(
            AttemptId::new(self.next_attempt_id),
            ShareId::generate(),
            attempt,
        );
        self.attempts.push(stored.clone());
        stored
    }

    fn check_responses(
        &self,
        attempt_id: AttemptId,
        responses: &[Response],
    ) -> Result<(), StorageError> {
        if !self.attempts.iter().any(|a| a.id() == attempt_id) {
            return Err(StorageError::NotFound);
        }
        for response in responses {
            if !self.questions.iter().any(|q| q.id == response.question_id) {
                return Err(StorageError::NotFound);
            }
        }
        Ok(())
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Number of stored questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn question_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.questions.len())
    }

    /// Number of stored attempts, across all users.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn attempt_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.attempts.len())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_questions(&self, limit: u32) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.questions.iter().take(limit).cloned().collect())
    }

    async fn find_question_by_key(
        &self,
        key: &QuestionKey,
    ) -> Result<Option<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .by_key
            .get(key)
            .and_then(|id| guard.questions.iter().find(|q| q.id == *id))
            .cloned())
    }

    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        let mut guard = self.lock()?;
        Ok(guard.insert_question(question))
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn create_attempt(&self, attempt: &NewAttempt) -> Result<Attempt, StorageError> {
        let mut guard = self.lock()?;
        Ok(guard.create_attempt(attempt))
    }

    async fn insert_responses(
        &self,
        attempt_id: AttemptId,
        responses: &[Response],
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.check_responses(attempt_id, responses)?;
        guard
            .responses
            .entry(attempt_id)
            .or_default()
            .extend_from_slice(responses);
        Ok(())
    }

    async fn record_attempt(
        &self,
        attempt: &NewAttempt,
        responses: &[Response],
    ) -> Result<Attempt, StorageError> {
        let mut guard = self.lock()?;
        if let Some(missing) = responses
            .iter()
            .find(|r| !guard.questions.iter().any(|q| q.id == r.question_id))
        {
            return Err(StorageError::Serialization(format!(
                "unknown question {}",
                missing.question_id
            )));
        }
        let stored = guard.create_attempt(attempt);
        guard.responses.insert(stored.id(), responses.to_vec());
        Ok(stored)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Attempt, StorageError> {
        let guard = self.lock()?;
        guard
            .attempts
            .iter()
            .find(|a| a.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn find_by_share_id(&self, share_id: ShareId) -> Result<Option<Attempt>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .attempts
            .iter()
            .find(|a| a.share_id() == share_id)
            .cloned())
    }

    async fn list_attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Attempt>, StorageError> {
        let guard = self.lock()?;
        let mut out: Vec<Attempt> = guard
            .attempts
            .iter()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.completed_at()
                .cmp(&a.completed_at())
                .then(b.id().cmp(&a.id()))
        });
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }

    async fn list_responses(&self, attempt_id: AttemptId) -> Result<Vec<Response>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .responses
            .get(&attempt_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            questions,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{
        Difficulty, Domain, DomainScores, OptionIndex, QuestionDraft, UserId,
    };
    use assess_core::time::fixed_now;
    use uuid::Uuid;

    fn validated(text: &str) -> ValidatedQuestion {
        QuestionDraft::new(text, ["a", "b", "c", "d"], 1, Domain::Tester, Difficulty::Easy)
            .validate()
            .unwrap()
    }

    #[tokio::test]
    async fn insert_question_reuses_normalized_text() {
        let repo = InMemoryRepository::new();
        let first = repo.insert_question(validated("What is a unit test?")).await.unwrap();
        let second = repo
            .insert_question(validated("  what is a UNIT   test? "))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.question_count().unwrap(), 1);

        let found = repo
            .find_question_by_key(&QuestionKey::from_text("WHAT IS A UNIT TEST?"))
            .await
            .unwrap();
        assert_eq!(found.map(|q| q.id), Some(first.id));
    }

    #[tokio::test]
    async fn record_attempt_is_all_or_nothing() {
        let repo = InMemoryRepository::new();
        let question = repo.insert_question(validated("Q1?")).await.unwrap();
        let attempt = NewAttempt {
            user_id: UserId::new(Uuid::nil()),
            scores: DomainScores::new(0, 0, 1),
            completed_at: fixed_now(),
        };

        let bogus = Response {
            question_id: QuestionId::new(999),
            selected_option: OptionIndex::new(1).unwrap(),
            is_correct: true,
        };
        assert!(repo.record_attempt(&attempt, &[bogus]).await.is_err());
        assert_eq!(repo.attempt_count().unwrap(), 0);

        let good = Response {
            question_id: question.id,
            selected_option: OptionIndex::new(1).unwrap(),
            is_correct: true,
        };
        let stored = repo.record_attempt(&attempt, &[good]).await.unwrap();
        assert_eq!(repo.list_responses(stored.id()).await.unwrap(), vec![good]);
        assert_eq!(
            repo.find_by_share_id(stored.share_id()).await.unwrap(),
            Some(stored)
        );
    }
}
