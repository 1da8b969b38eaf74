use std::collections::HashSet;
use std::sync::Arc;

use assess_core::model::{Domain, Question, QuestionDraft, QuestionId, QuestionKey};
use storage::repository::{QuestionRepository, StorageError};
use tracing::{debug, info, warn};

use super::sources::{Candidate, GeneratedSource, QuestionSource, StoreSource, TemplateSource};
use crate::ai::QuestionGenerator;
use crate::error::SessionError;

/// Outcome of resolving a session's question set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuestions {
    /// Distinct, persisted questions in session order.
    pub questions: Vec<Question>,
    /// Valid candidates lost to storage failures during reconciliation.
    pub dropped: usize,
    /// Candidates that failed validation or came back for the wrong domain.
    pub rejected: usize,
    /// Sources that contributed at least one question, in chain order.
    pub sources_used: Vec<&'static str>,
}

impl ResolvedQuestions {
    /// True when some generated or template content could not be saved.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.dropped > 0
    }
}

/// Builds a question set by walking an ordered chain of sources.
///
/// Each source is asked only for the remaining shortfall. Drafts are validated
/// and matched against the store by normalized text so every returned question
/// carries a stored id.
pub struct QuestionResolver {
    questions: Arc<dyn QuestionRepository>,
    sources: Vec<Box<dyn QuestionSource>>,
}

enum Reconciled {
    Accepted(Question),
    Duplicate,
    Rejected(String),
    Failed(StorageError),
}

#[derive(Default)]
struct WorkingSet {
    questions: Vec<Question>,
    keys: HashSet<QuestionKey>,
    ids: HashSet<QuestionId>,
}

impl WorkingSet {
    fn len(&self) -> usize {
        self.questions.len()
    }

    fn has_key(&self, key: &QuestionKey) -> bool {
        self.keys.contains(key)
    }

    fn push(&mut self, question: Question) -> bool {
        let key = question.key();
        if self.ids.contains(&question.id) || self.keys.contains(&key) {
            return false;
        }
        self.ids.insert(question.id);
        self.keys.insert(key);
        self.questions.push(question);
        true
    }
}

impl QuestionResolver {
    /// Resolver with an empty chain. Add sources with [`QuestionResolver::with_source`].
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self {
            questions,
            sources: Vec::new(),
        }
    }

    /// Store, then generator (when given), then the built-in templates.
    #[must_use]
    pub fn standard(
        questions: Arc<dyn QuestionRepository>,
        generator: Option<Arc<dyn QuestionGenerator>>,
        store_pool: u32,
    ) -> Self {
        let mut resolver = Self::new(Arc::clone(&questions))
            .with_source(StoreSource::new(questions, store_pool));
        if let Some(generator) = generator {
            resolver = resolver.with_source(GeneratedSource::new(generator));
        }
        resolver.with_source(TemplateSource::builtin())
    }

    #[must_use]
    pub fn with_source(mut self, source: impl QuestionSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Resolve up to `target` distinct questions.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotAuthenticated` if the store rejects the caller's credentials.
    /// - `SessionError::NoQuestionsAvailable` if fewer than `min` (and at least one)
    ///   questions could be resolved.
    pub async fn resolve(
        &self,
        target: usize,
        min: usize,
    ) -> Result<ResolvedQuestions, SessionError> {
        let mut working = WorkingSet::default();
        let mut dropped = 0;
        let mut rejected = 0;
        let mut sources_used = Vec::new();

        for source in &self.sources {
            let deficit = target.saturating_sub(working.len());
            if deficit == 0 {
                break;
            }

            let candidates = match source.candidates(deficit).await {
                Ok(candidates) => candidates,
                Err(err) if err.is_credential_expired() => {
                    return Err(SessionError::NotAuthenticated);
                }
                Err(err) => {
                    warn!(source = source.name(), error = %err, "question source failed, falling back");
                    continue;
                }
            };

            let before = working.len();
            for candidate in candidates {
                if working.len() >= target {
                    break;
                }
                match self.reconcile(candidate, &working).await {
                    Reconciled::Accepted(question) => {
                        if !working.push(question) {
                            debug!(source = source.name(), "skipped duplicate question");
                        }
                    }
                    Reconciled::Duplicate => {
                        debug!(source = source.name(), "skipped duplicate question");
                    }
                    Reconciled::Rejected(reason) => {
                        rejected += 1;
                        debug!(source = source.name(), %reason, "rejected question candidate");
                    }
                    Reconciled::Failed(err) if err.is_credential_expired() => {
                        return Err(SessionError::NotAuthenticated);
                    }
                    Reconciled::Failed(err) => {
                        dropped += 1;
                        warn!(source = source.name(), error = %err, "dropped question candidate");
                    }
                }
            }

            let added = working.len() - before;
            if added > 0 {
                sources_used.push(source.name());
            }
            if working.len() < target {
                info!(
                    source = source.name(),
                    added,
                    have = working.len(),
                    target,
                    "question source came up short"
                );
            }
        }

        if working.questions.is_empty() || working.len() < min {
            warn!(have = working.len(), min, "not enough questions to start");
            return Err(SessionError::NoQuestionsAvailable);
        }

        Ok(ResolvedQuestions {
            questions: working.questions,
            dropped,
            rejected,
            sources_used,
        })
    }

    async fn reconcile(&self, candidate: Candidate, working: &WorkingSet) -> Reconciled {
        match candidate {
            Candidate::Stored(question) => Reconciled::Accepted(question),
            Candidate::Generated { draft, requested } => {
                self.reconcile_draft(draft, working, |domain| {
                    (domain != requested).then(|| format!("expected {requested}, got {domain}"))
                })
                .await
            }
            Candidate::Template(draft) => self.reconcile_draft(draft, working, |_| None).await,
        }
    }

    async fn reconcile_draft(
        &self,
        draft: QuestionDraft,
        working: &WorkingSet,
        domain_check: impl FnOnce(Domain) -> Option<String>,
    ) -> Reconciled {
        let validated = match draft.validate() {
            Ok(validated) => validated,
            Err(err) => return Reconciled::Rejected(err.to_string()),
        };
        if let Some(reason) = domain_check(validated.domain) {
            return Reconciled::Rejected(reason);
        }

        let key = validated.key();
        if working.has_key(&key) {
            return Reconciled::Duplicate;
        }

        match self.questions.find_question_by_key(&key).await {
            Ok(Some(existing)) => Reconciled::Accepted(existing),
            Ok(None) => match self.questions.insert_question(validated).await {
                Ok(inserted) => Reconciled::Accepted(inserted),
                Err(err) => Reconciled::Failed(err),
            },
            Err(err) => Reconciled::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::Difficulty;
    use storage::repository::InMemoryRepository;

    fn draft(text: &str, domain: Domain) -> QuestionDraft {
        QuestionDraft::new(text, ["a", "b", "c", "d"], 1, domain, Difficulty::Easy)
    }

    #[tokio::test]
    async fn templates_are_inserted_once_and_reused() {
        let repo = Arc::new(InMemoryRepository::new());
        let templates = vec![draft("One?", Domain::Tester), draft("Two?", Domain::Analytics)];

        let resolver =
            QuestionResolver::new(repo.clone()).with_source(TemplateSource::new(templates.clone()));
        let first = resolver.resolve(5, 1).await.unwrap();
        assert_eq!(first.questions.len(), 2);
        assert_eq!(first.sources_used, vec!["templates"]);
        assert_eq!(repo.question_count().unwrap(), 2);

        let second = resolver.resolve(5, 1).await.unwrap();
        assert_eq!(repo.question_count().unwrap(), 2);
        let mut a: Vec<_> = first.questions.iter().map(|q| q.id).collect();
        let mut b: Vec<_> = second.questions.iter().map(|q| q.id).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn invalid_and_duplicate_drafts_are_filtered() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut bad = draft("Bad?", Domain::Tester);
        bad.correct_option = 7;
        let templates = vec![
            draft("Same question?", Domain::Tester),
            draft("  same QUESTION? ", Domain::Tester),
            bad,
        ];

        let resolved = QuestionResolver::new(repo.clone())
            .with_source(TemplateSource::new(templates))
            .resolve(10, 1)
            .await
            .unwrap();

        assert_eq!(resolved.questions.len(), 1);
        assert_eq!(resolved.rejected, 1);
        assert_eq!(resolved.dropped, 0);
    }

    #[tokio::test]
    async fn empty_chain_reports_no_questions() {
        let repo = Arc::new(InMemoryRepository::new());
        let err = QuestionResolver::new(repo.clone())
            .with_source(TemplateSource::new(Vec::new()))
            .resolve(30, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoQuestionsAvailable));
    }

    #[tokio::test]
    async fn below_minimum_reports_no_questions() {
        let repo = Arc::new(InMemoryRepository::new());
        let err = QuestionResolver::new(repo.clone())
            .with_source(TemplateSource::new(vec![draft("Only one?", Domain::Programmer)]))
            .resolve(30, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoQuestionsAvailable));
    }
}
