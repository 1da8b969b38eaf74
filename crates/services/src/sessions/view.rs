use chrono::{DateTime, Utc};
use std::sync::Arc;

use assess_core::model::{
    Attempt, AttemptId, Domain, DomainScores, Response, ShareId, UserId,
};
use storage::repository::AttemptRepository;

use crate::error::SessionError;

/// Presentation-agnostic list item for a stored attempt.
///
/// No pre-formatted strings; the caller formats timestamps and percentages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptListItem {
    pub id: AttemptId,
    pub share_id: ShareId,
    pub completed_at: DateTime<Utc>,
    pub scores: DomainScores,
    pub total: u32,
    pub recommended: Domain,
}

impl AttemptListItem {
    #[must_use]
    pub fn from_attempt(attempt: &Attempt) -> Self {
        Self {
            id: attempt.id(),
            share_id: attempt.share_id(),
            completed_at: attempt.completed_at(),
            scores: attempt.scores(),
            total: attempt.total_score(),
            recommended: attempt.recommended_domain(),
        }
    }
}

/// What a shared result link reveals. Carries no user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicResult {
    pub share_id: ShareId,
    pub completed_at: DateTime<Utc>,
    pub scores: DomainScores,
    pub total: u32,
    pub recommended: Domain,
}

impl PublicResult {
    #[must_use]
    pub fn from_attempt(attempt: &Attempt) -> Self {
        Self {
            share_id: attempt.share_id(),
            completed_at: attempt.completed_at(),
            scores: attempt.scores(),
            total: attempt.total_score(),
            recommended: attempt.recommended_domain(),
        }
    }
}

/// Read side for finished attempts: history, detail and shared results.
#[derive(Clone)]
pub struct AttemptHistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptHistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// Most recent attempts for `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<AttemptListItem>, SessionError> {
        let attempts = self.attempts.list_attempts_for_user(user_id, limit).await?;
        Ok(attempts.iter().map(AttemptListItem::from_attempt).collect())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` (including `NotFound`) on repository failures.
    pub async fn get(&self, id: AttemptId) -> Result<Attempt, SessionError> {
        Ok(self.attempts.get_attempt(id).await?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn responses(&self, id: AttemptId) -> Result<Vec<Response>, SessionError> {
        Ok(self.attempts.list_responses(id).await?)
    }

    /// Look up a result by its shareable id. `None` for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn public_result(
        &self,
        share_id: ShareId,
    ) -> Result<Option<PublicResult>, SessionError> {
        let attempt = self.attempts.find_by_share_id(share_id).await?;
        Ok(attempt.as_ref().map(PublicResult::from_attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::NewAttempt;
    use assess_core::time::fixed_now;
    use chrono::Duration;
    use storage::repository::InMemoryRepository;
    use uuid::Uuid;

    #[tokio::test]
    async fn history_lists_newest_first_and_shares_without_identity() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::new(Uuid::from_u128(9));
        let older = repo
            .create_attempt(&NewAttempt {
                user_id: user,
                scores: DomainScores::new(1, 2, 3),
                completed_at: fixed_now(),
            })
            .await
            .unwrap();
        let newer = repo
            .create_attempt(&NewAttempt {
                user_id: user,
                scores: DomainScores::new(4, 0, 0),
                completed_at: fixed_now() + Duration::hours(1),
            })
            .await
            .unwrap();

        let service = AttemptHistoryService::new(repo);
        let items = service.list_for_user(user, 10).await.unwrap();
        assert_eq!(
            items.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![newer.id(), older.id()]
        );
        assert_eq!(items[1].recommended, Domain::Tester);
        assert_eq!(items[1].total, 6);

        let shared = service
            .public_result(older.share_id())
            .await
            .unwrap()
            .expect("shared result");
        assert_eq!(shared.scores, DomainScores::new(1, 2, 3));

        assert!(service
            .public_result(ShareId::generate())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unknown_attempt_is_a_storage_error() {
        let service =
            AttemptHistoryService::new(Arc::new(storage::repository::InMemoryRepository::new()));
        let err = service.get(AttemptId::new(1)).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Storage(storage::repository::StorageError::NotFound)
        ));
    }
}
