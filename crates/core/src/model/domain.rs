use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("unknown domain: {0}")]
    UnknownDomain(String),
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DOMAIN ────────────────────────────────────────────────────────────────────
//

/// Career category a question (and a score) belongs to.
///
/// Variant order is the recommendation tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Programmer,
    Analytics,
    Tester,
}

impl Domain {
    /// All domains, highest tie-break priority first.
    pub const ALL: [Domain; 3] = [Domain::Programmer, Domain::Analytics, Domain::Tester];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Programmer => "programmer",
            Domain::Analytics => "analytics",
            Domain::Tester => "tester",
        }
    }
}

impl FromStr for Domain {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "programmer" => Ok(Domain::Programmer),
            "analytics" => Ok(Domain::Analytics),
            "tester" => Ok(Domain::Tester),
            _ => Err(TagError::UnknownDomain(s.to_owned())),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(TagError::UnknownDifficulty(s.to_owned())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
