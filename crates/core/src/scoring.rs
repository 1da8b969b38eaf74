//! Pure scoring of an answer sheet against its question set.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{DomainScores, NewAttempt, OptionIndex, Question, Response, UserId};

/// Domain scores plus the per-question responses they were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scorecard {
    pub scores: DomainScores,
    pub responses: Vec<Response>,
}

impl Scorecard {
    /// Score `answers` (question index → 0-based option) against `questions`.
    ///
    /// Indices without a question and positions outside the four options are
    /// treated as unanswered. Responses come out in question order.
    #[must_use]
    pub fn from_answers(questions: &[Question], answers: &BTreeMap<usize, u8>) -> Self {
        let mut scores = DomainScores::default();
        let mut responses = Vec::with_capacity(answers.len());

        for (&index, &position) in answers {
            let Some(question) = questions.get(index) else {
                continue;
            };
            let Ok(selected) = OptionIndex::from_zero_based(position) else {
                continue;
            };

            let is_correct = question.is_correct(selected);
            if is_correct {
                scores.increment(question.domain);
            }
            responses.push(Response {
                question_id: question.id,
                selected_option: selected,
                is_correct,
            });
        }

        Self { scores, responses }
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_correct).count()
    }

    #[must_use]
    pub fn to_new_attempt(&self, user_id: UserId, completed_at: DateTime<Utc>) -> NewAttempt {
        NewAttempt {
            user_id,
            scores: self.scores,
            completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, Domain, QuestionDraft, QuestionId};

    fn question(id: u64, domain: Domain, correct: i64) -> Question {
        QuestionDraft::new(
            format!("Question {id}?"),
            ["a", "b", "c", "d"],
            correct,
            domain,
            Difficulty::Medium,
        )
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(id))
    }

    fn question_set() -> Vec<Question> {
        vec![
            question(1, Domain::Programmer, 1),
            question(2, Domain::Analytics, 2),
            question(3, Domain::Tester, 3),
            question(4, Domain::Tester, 4),
        ]
    }

    #[test]
    fn counts_correct_answers_per_domain() {
        let answers = BTreeMap::from([(0, 0), (1, 0), (2, 2), (3, 3)]);
        let card = Scorecard::from_answers(&question_set(), &answers);

        assert_eq!(card.scores, DomainScores::new(1, 0, 2));
        assert_eq!(card.scores.total(), 3);
        assert_eq!(card.scores.recommended(), Domain::Tester);
        assert_eq!(card.responses.len(), 4);
        assert_eq!(card.correct_count(), 3);
        assert!(!card.responses[1].is_correct);
        assert_eq!(card.responses[1].selected_option.value(), 1);
    }

    #[test]
    fn empty_sheet_scores_zero_and_recommends_programmer() {
        let card = Scorecard::from_answers(&question_set(), &BTreeMap::new());
        assert_eq!(card.scores, DomainScores::default());
        assert!(card.responses.is_empty());
        assert_eq!(card.scores.recommended(), Domain::Programmer);
    }

    #[test]
    fn unknown_indices_and_positions_are_ignored() {
        let answers = BTreeMap::from([(0, 0), (9, 1), (2, 7)]);
        let card = Scorecard::from_answers(&question_set(), &answers);
        assert_eq!(card.responses.len(), 1);
        assert_eq!(card.responses[0].question_id, QuestionId::new(1));
    }

    #[test]
    fn total_always_matches_domain_sum() {
        let questions = question_set();
        for mask in 0_u8..16 {
            let answers: BTreeMap<usize, u8> = (0..4)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| (i, u8::try_from(i).unwrap()))
                .collect();
            let card = Scorecard::from_answers(&questions, &answers);
            let s = card.scores;
            assert_eq!(s.total(), s.programmer + s.analytics + s.tester);
        }
    }
}
