use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::domain::{Difficulty, Domain, TagError};
use crate::model::ids::QuestionId;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text must not be empty")]
    EmptyText,

    #[error("option {0} must not be empty")]
    EmptyOption(usize),

    #[error("correct option must be between 1 and 4, got {0}")]
    InvalidOption(i64),

    #[error(transparent)]
    Tag(#[from] TagError),
}

//
// ─── OPTION INDEX ──────────────────────────────────────────────────────────────
//

/// 1-based option position, always within `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct OptionIndex(u8);

impl OptionIndex {
    /// Builds an index from its 1-based value.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidOption` outside `1..=4`.
    pub fn new(value: i64) -> Result<Self, QuestionError> {
        match u8::try_from(value) {
            Ok(v) if (1..=4).contains(&v) => Ok(Self(v)),
            _ => Err(QuestionError::InvalidOption(value)),
        }
    }

    /// Builds an index from the 0-based position a selection UI works with.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidOption` when `position >= 4`.
    pub fn from_zero_based(position: u8) -> Result<Self, QuestionError> {
        Self::new(i64::from(position) + 1)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn zero_based(self) -> u8 {
        self.0 - 1
    }
}

impl TryFrom<i64> for OptionIndex {
    type Error = QuestionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OptionIndex> for i64 {
    fn from(value: OptionIndex) -> Self {
        i64::from(value.0)
    }
}

//
// ─── NORMALIZED KEY ────────────────────────────────────────────────────────────
//

/// Lookup key used to de-duplicate questions by content.
///
/// Whitespace runs collapse to a single space, the ends are trimmed and the
/// text is lowercased, so "What is  SQL?" and "what is sql? " share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionKey(String);

impl QuestionKey {
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Self(collapsed.to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question candidate, as produced by generators and template banks.
///
/// Every field defaults so that partially filled payloads still deserialize and
/// are rejected by `validate` instead of failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub option_1: String,
    #[serde(default)]
    pub option_2: String,
    #[serde(default)]
    pub option_3: String,
    #[serde(default)]
    pub option_4: String,
    #[serde(default, alias = "correct_answer")]
    pub correct_option: i64,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub difficulty: String,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        question_text: impl Into<String>,
        options: [&str; OPTION_COUNT],
        correct_option: i64,
        domain: Domain,
        difficulty: Difficulty,
    ) -> Self {
        let [option_1, option_2, option_3, option_4] = options.map(str::to_owned);
        Self {
            question_text: question_text.into(),
            option_1,
            option_2,
            option_3,
            option_4,
            correct_option,
            domain: domain.as_str().to_owned(),
            difficulty: difficulty.as_str().to_owned(),
        }
    }

    /// Checks text, options, correct option and tags.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` found.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        let text = self.question_text.trim();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let raw = [self.option_1, self.option_2, self.option_3, self.option_4];
        let mut options: [String; OPTION_COUNT] = Default::default();
        for (position, option) in raw.iter().enumerate() {
            let trimmed = option.trim();
            if trimmed.is_empty() {
                return Err(QuestionError::EmptyOption(position + 1));
            }
            options[position] = trimmed.to_owned();
        }

        let correct_option = OptionIndex::new(self.correct_option)?;
        let domain = self.domain.parse::<Domain>()?;
        let difficulty = self.difficulty.parse::<Difficulty>()?;

        Ok(ValidatedQuestion {
            text: text.to_owned(),
            options,
            correct_option,
            domain,
            difficulty,
        })
    }
}

/// A well-formed question that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub text: String,
    pub options: [String; OPTION_COUNT],
    pub correct_option: OptionIndex,
    pub domain: Domain,
    pub difficulty: Difficulty,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn key(&self) -> QuestionKey {
        QuestionKey::from_text(&self.text)
    }

    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            text: self.text,
            options: self.options,
            correct_option: self.correct_option,
            domain: self.domain,
            difficulty: self.difficulty,
        }
    }
}

/// A persisted question that responses can reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: [String; OPTION_COUNT],
    pub correct_option: OptionIndex,
    pub domain: Domain,
    pub difficulty: Difficulty,
}

impl Question {
    #[must_use]
    pub fn key(&self) -> QuestionKey {
        QuestionKey::from_text(&self.text)
    }

    #[must_use]
    pub fn is_correct(&self, selected: OptionIndex) -> bool {
        self.correct_option == selected
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
