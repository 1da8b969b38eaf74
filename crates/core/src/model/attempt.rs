use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::domain::Domain;
use crate::model::ids::{AttemptId, QuestionId, ShareId, UserId};
use crate::model::question::OptionIndex;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("total score ({total}) does not match domain scores ({sum})")]
    TotalMismatch { total: u32, sum: u32 },

    #[error("recommended domain {stored} does not match scores (expected {derived})")]
    RecommendationMismatch { stored: Domain, derived: Domain },
}

//
// ─── DOMAIN SCORES ─────────────────────────────────────────────────────────────
//

/// Correct-answer counts per domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainScores {
    pub programmer: u32,
    pub analytics: u32,
    pub tester: u32,
}

impl DomainScores {
    #[must_use]
    pub fn new(programmer: u32, analytics: u32, tester: u32) -> Self {
        Self {
            programmer,
            analytics,
            tester,
        }
    }

    #[must_use]
    pub fn get(&self, domain: Domain) -> u32 {
        match domain {
            Domain::Programmer => self.programmer,
            Domain::Analytics => self.analytics,
            Domain::Tester => self.tester,
        }
    }

    pub fn increment(&mut self, domain: Domain) {
        let slot = match domain {
            Domain::Programmer => &mut self.programmer,
            Domain::Analytics => &mut self.analytics,
            Domain::Tester => &mut self.tester,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.programmer
            .saturating_add(self.analytics)
            .saturating_add(self.tester)
    }

    /// Domain with the highest count; ties go to programmer, then analytics.
    #[must_use]
    pub fn recommended(&self) -> Domain {
        if self.programmer >= self.analytics && self.programmer >= self.tester {
            Domain::Programmer
        } else if self.analytics >= self.tester {
            Domain::Analytics
        } else {
            Domain::Tester
        }
    }

    /// Share of the total earned in `domain`, in percent. Zero when nothing scored.
    #[must_use]
    pub fn percentage(&self, domain: Domain) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.get(domain)) * 100.0 / f64::from(total)
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// Scores of a finished session, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttempt {
    pub user_id: UserId,
    pub scores: DomainScores,
    pub completed_at: DateTime<Utc>,
}

impl NewAttempt {
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.scores.total()
    }

    #[must_use]
    pub fn recommended_domain(&self) -> Domain {
        self.scores.recommended()
    }
}

/// Persisted record of one completed assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    id: AttemptId,
    user_id: UserId,
    share_id: ShareId,
    scores: DomainScores,
    completed_at: DateTime<Utc>,
}

impl Attempt {
    /// Builds an attempt for a freshly stored `NewAttempt`.
    #[must_use]
    pub fn created(id: AttemptId, share_id: ShareId, new: &NewAttempt) -> Self {
        Self {
            id,
            user_id: new.user_id,
            share_id,
            scores: new.scores,
            completed_at: new.completed_at,
        }
    }

    /// Rehydrate an attempt from storage, re-checking the derived columns.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::TotalMismatch` or `AttemptError::RecommendationMismatch`
    /// when the stored row disagrees with its own domain scores.
    pub fn from_persisted(
        id: AttemptId,
        user_id: UserId,
        share_id: ShareId,
        scores: DomainScores,
        total_score: u32,
        recommended: Domain,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        let sum = scores.total();
        if sum != total_score {
            return Err(AttemptError::TotalMismatch {
                total: total_score,
                sum,
            });
        }
        let derived = scores.recommended();
        if derived != recommended {
            return Err(AttemptError::RecommendationMismatch {
                stored: recommended,
                derived,
            });
        }

        Ok(Self {
            id,
            user_id,
            share_id,
            scores,
            completed_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn share_id(&self) -> ShareId {
        self.share_id
    }

    #[must_use]
    pub fn scores(&self) -> DomainScores {
        self.scores
    }

    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.scores.total()
    }

    #[must_use]
    pub fn recommended_domain(&self) -> Domain {
        self.scores.recommended()
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// One answered question inside an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub question_id: QuestionId,
    pub selected_option: OptionIndex,
    pub is_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use uuid::Uuid;

    #[test]
    fn recommendation_breaks_ties_in_priority_order() {
        assert_eq!(DomainScores::new(5, 5, 7).recommended(), Domain::Tester);
        assert_eq!(DomainScores::new(5, 5, 3).recommended(), Domain::Programmer);
        assert_eq!(DomainScores::new(3, 5, 5).recommended(), Domain::Analytics);
        assert_eq!(DomainScores::new(4, 2, 4).recommended(), Domain::Programmer);
        assert_eq!(DomainScores::default().recommended(), Domain::Programmer);
    }

    #[test]
    fn percentage_is_zero_without_points() {
        assert_eq!(DomainScores::default().percentage(Domain::Tester), 0.0);
        let scores = DomainScores::new(1, 1, 2);
        assert!((scores.percentage(Domain::Tester) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn from_persisted_rejects_inconsistent_rows() {
        let user = UserId::new(Uuid::nil());
        let share = ShareId::generate();
        let scores = DomainScores::new(2, 1, 0);

        let err = Attempt::from_persisted(
            AttemptId::new(1),
            user,
            share,
            scores,
            4,
            Domain::Programmer,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::TotalMismatch { total: 4, sum: 3 });

        let err = Attempt::from_persisted(
            AttemptId::new(1),
            user,
            share,
            scores,
            3,
            Domain::Tester,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, AttemptError::RecommendationMismatch { .. }));

        let ok = Attempt::from_persisted(
            AttemptId::new(1),
            user,
            share,
            scores,
            3,
            Domain::Programmer,
            fixed_now(),
        )
        .unwrap();
        assert_eq!(ok.total_score(), 3);
    }
}
