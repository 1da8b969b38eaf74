/// Where a session is in its single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Done,
}

/// Admits at most one submission at a time and exactly one successful one.
///
/// Callers hold the session lock around every transition, so `try_begin` is a
/// test-and-set.
#[derive(Debug, Default)]
pub struct SubmissionGuard {
    phase: SubmissionPhase,
}

impl SubmissionGuard {
    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// `Idle → Submitting`. Returns false (and changes nothing) from any other phase.
    pub fn try_begin(&mut self) -> bool {
        if self.phase == SubmissionPhase::Idle {
            self.phase = SubmissionPhase::Submitting;
            true
        } else {
            false
        }
    }

    /// `Submitting → Idle` after a retryable failure.
    pub fn release(&mut self) {
        if self.phase == SubmissionPhase::Submitting {
            self.phase = SubmissionPhase::Idle;
        }
    }

    /// Terminal. Used on success and when the session can no longer submit.
    pub fn finish(&mut self) {
        self.phase = SubmissionPhase::Done;
    }
}
