use super::guard::SubmissionPhase;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    pub current: usize,
    pub remaining_secs: u64,
    pub phase: SubmissionPhase,
}

impl SessionProgress {
    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }
}

/// Per-question state shown in a question palette.
///
/// An answered question reports `Answered` even when it is also marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Answered,
    Marked,
    NotAnswered,
}

impl QuestionStatus {
    #[must_use]
    pub fn from_flags(answered: bool, marked: bool) -> Self {
        match (answered, marked) {
            (true, _) => Self::Answered,
            (false, true) => Self::Marked,
            (false, false) => Self::NotAnswered,
        }
    }
}
