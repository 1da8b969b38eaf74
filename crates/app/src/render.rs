//! Plain-text rendering for the terminal front end.

use std::fmt::Write as _;

use assess_core::model::{Domain, DomainScores, Question};
use services::{AttemptListItem, PublicResult, QuestionStatus, SessionProgress};

const OPTION_LABELS: [char; 4] = ['a', 'b', 'c', 'd'];

/// `mm:ss`, with hours folded into minutes.
#[must_use]
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[must_use]
pub fn question_block(
    question: &Question,
    progress: &SessionProgress,
    selected: Option<u8>,
    marked: bool,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "\n[{}/{}] {} left",
        progress.current + 1,
        progress.total,
        format_clock(progress.remaining_secs)
    );
    if marked {
        out.push_str("  (marked for review)");
    }
    let _ = writeln!(out, "\n{}", question.text);
    for (i, option) in question.options.iter().enumerate() {
        let chosen = selected == u8::try_from(i).ok();
        let pointer = if chosen { '>' } else { ' ' };
        let _ = writeln!(out, " {pointer} {}) {option}", OPTION_LABELS[i]);
    }
    out
}

/// One character per question: `*` answered, `?` marked, `.` open.
#[must_use]
pub fn palette(statuses: &[QuestionStatus], current: usize) -> String {
    let mut out = String::with_capacity(statuses.len() * 2);
    for (i, status) in statuses.iter().enumerate() {
        if i > 0 && i % 10 == 0 {
            out.push('\n');
        }
        let glyph = match status {
            QuestionStatus::Answered => '*',
            QuestionStatus::Marked => '?',
            QuestionStatus::NotAnswered => '.',
        };
        if i == current {
            let _ = write!(out, "[{glyph}]");
        } else {
            let _ = write!(out, " {glyph} ");
        }
    }
    out
}

#[must_use]
pub fn progress_line(progress: &SessionProgress) -> String {
    format!(
        "answered {} / {}, marked {}, unanswered {}",
        progress.answered,
        progress.total,
        progress.marked,
        progress.unanswered()
    )
}

#[must_use]
pub fn score_table(scores: &DomainScores, recommended: Domain) -> String {
    let mut out = String::new();
    for domain in Domain::ALL {
        let _ = writeln!(
            out,
            "  {:<11} {:>3}  {:>5.1}%",
            domain.as_str(),
            scores.get(domain),
            scores.percentage(domain)
        );
    }
    let _ = write!(out, "Recommended path: {recommended}");
    out
}

#[must_use]
pub fn public_result(result: &PublicResult) -> String {
    format!(
        "Result {} ({})\nTotal correct: {}\n{}",
        result.share_id,
        result.completed_at.format("%Y-%m-%d %H:%M UTC"),
        result.total,
        score_table(&result.scores, result.recommended)
    )
}

#[must_use]
pub fn history_line(item: &AttemptListItem) -> String {
    format!(
        "{}  #{:<5} total {:>3}  {:<10}  share {}",
        item.completed_at.format("%Y-%m-%d %H:%M"),
        item.id.value(),
        item.total,
        item.recommended.as_str(),
        item.share_id
    )
}

pub const HELP: &str = "\
Commands:
  a-d or 1-4   answer the current question and move on
  n / p        next / previous question
  g <number>   go to a question
  m            mark or unmark for review
  x            clear the current answer
  l            list all questions
  s            submit now
  q            quit without saving
  ?            show this help";
