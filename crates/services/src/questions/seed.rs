use assess_core::model::QuestionDraft;
use storage::repository::{QuestionRepository, StorageError};
use tracing::{info, warn};

/// Counts from a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub existing: usize,
    pub invalid: usize,
}

/// Store every valid draft whose normalized text is not present yet.
///
/// Running it twice inserts nothing the second time.
///
/// # Errors
///
/// Returns the first `StorageError` raised by the repository.
pub async fn seed_questions(
    questions: &dyn QuestionRepository,
    drafts: Vec<QuestionDraft>,
) -> Result<SeedReport, StorageError> {
    let mut report = SeedReport::default();

    for draft in drafts {
        let validated = match draft.validate() {
            Ok(validated) => validated,
            Err(err) => {
                warn!(error = %err, "skipping invalid seed question");
                report.invalid += 1;
                continue;
            }
        };
        if questions.find_question_by_key(&validated.key()).await?.is_some() {
            report.existing += 1;
            continue;
        }
        questions.insert_question(validated).await?;
        report.inserted += 1;
    }

    info!(
        inserted = report.inserted,
        existing = report.existing,
        invalid = report.invalid,
        "seeded question bank"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::template_drafts;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let repo = InMemoryRepository::new();
        let total = template_drafts().len();

        let first = seed_questions(&repo, template_drafts()).await.unwrap();
        assert_eq!(first.inserted, total);
        assert_eq!(first.existing, 0);

        let second = seed_questions(&repo, template_drafts()).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.existing, total);
        assert_eq!(repo.question_count().unwrap(), total);
    }
}
