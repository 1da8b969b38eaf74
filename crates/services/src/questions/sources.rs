use std::sync::Arc;

use assess_core::model::{Domain, Question, QuestionDraft};
use rand::seq::SliceRandom;
use storage::repository::{QuestionRepository, StorageError};
use tracing::{debug, warn};

use super::bank;
use crate::ai::QuestionGenerator;
use crate::error::GeneratorError;

/// A question offered to the resolver by one source.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// Already persisted; usable as is.
    Stored(Question),
    /// Produced for `requested`; must validate, match that domain and be reconciled.
    Generated {
        draft: QuestionDraft,
        requested: Domain,
    },
    /// From the built-in bank; must validate and be reconciled.
    Template(QuestionDraft),
}

/// One link of the resolver's fallback chain.
#[async_trait::async_trait]
pub trait QuestionSource: Send + Sync {
    /// Short label used in logs and in `ResolvedQuestions::sources_used`.
    fn name(&self) -> &'static str;

    /// Offer candidates towards a shortfall of `deficit` questions.
    ///
    /// Sources may offer more than `deficit`; the resolver stops once it has enough.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backing store cannot be read.
    async fn candidates(&self, deficit: usize) -> Result<Vec<Candidate>, StorageError>;
}

fn shuffled<T>(mut items: Vec<T>) -> Vec<T> {
    let mut rng = rand::rng();
    items.as_mut_slice().shuffle(&mut rng);
    items
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Random sample of questions already in the store.
pub struct StoreSource {
    questions: Arc<dyn QuestionRepository>,
    pool_limit: u32,
}

impl StoreSource {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>, pool_limit: u32) -> Self {
        Self {
            questions,
            pool_limit,
        }
    }
}

#[async_trait::async_trait]
impl QuestionSource for StoreSource {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn candidates(&self, deficit: usize) -> Result<Vec<Candidate>, StorageError> {
        let pool = self.questions.list_questions(self.pool_limit).await?;
        debug!(pool = pool.len(), deficit, "sampling stored questions");
        let mut sample = shuffled(pool);
        sample.truncate(deficit);
        Ok(sample.into_iter().map(Candidate::Stored).collect())
    }
}

//
// ─── GENERATED ─────────────────────────────────────────────────────────────────
//

/// Fresh drafts from a `QuestionGenerator`, split evenly across domains.
pub struct GeneratedSource {
    generator: Arc<dyn QuestionGenerator>,
}

impl GeneratedSource {
    #[must_use]
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait::async_trait]
impl QuestionSource for GeneratedSource {
    fn name(&self) -> &'static str {
        "generator"
    }

    async fn candidates(&self, deficit: usize) -> Result<Vec<Candidate>, StorageError> {
        let per_domain = deficit.div_ceil(Domain::ALL.len());
        let mut out = Vec::new();

        for domain in Domain::ALL {
            match self.generator.generate_questions(domain, per_domain).await {
                Ok(drafts) => {
                    debug!(domain = %domain, received = drafts.len(), "generated questions");
                    out.extend(drafts.into_iter().map(|draft| Candidate::Generated {
                        draft,
                        requested: domain,
                    }));
                }
                Err(GeneratorError::Disabled) => {
                    debug!("question generator disabled");
                    break;
                }
                Err(err) => {
                    // One failing domain does not stop the others.
                    warn!(domain = %domain, error = %err, "question generation failed");
                }
            }
        }

        Ok(shuffled(out))
    }
}

//
// ─── TEMPLATES ─────────────────────────────────────────────────────────────────
//

/// Fixed drafts, by default the built-in bank.
pub struct TemplateSource {
    drafts: Vec<QuestionDraft>,
}

impl TemplateSource {
    #[must_use]
    pub fn new(drafts: Vec<QuestionDraft>) -> Self {
        Self { drafts }
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self::new(bank::template_drafts())
    }
}

#[async_trait::async_trait]
impl QuestionSource for TemplateSource {
    fn name(&self) -> &'static str {
        "templates"
    }

    async fn candidates(&self, _deficit: usize) -> Result<Vec<Candidate>, StorageError> {
        Ok(shuffled(self.drafts.clone())
            .into_iter()
            .map(Candidate::Template)
            .collect())
    }
}
