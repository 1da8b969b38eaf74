//! Interactive terminal loop for one timed assessment.

use services::{
    AssessmentSession, AssessmentService, QuestionStatus, SessionError, SessionStatus,
    SubmitTrigger,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render;

/// One line of user input, already interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// 0-based option.
    Answer(u8),
    Next,
    Previous,
    /// 0-based question index.
    GoTo(usize),
    Mark,
    Clear,
    List,
    Submit,
    Quit,
    Help,
}

/// Interpret a line typed at the prompt. `None` for blank or unknown input.
#[must_use]
pub fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim().to_ascii_lowercase();
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let input = match head {
        "a" | "1" => Input::Answer(0),
        "b" | "2" => Input::Answer(1),
        "c" | "3" => Input::Answer(2),
        "d" | "4" => Input::Answer(3),
        "n" | "next" => Input::Next,
        "p" | "prev" | "previous" => Input::Previous,
        "g" | "go" | "goto" => {
            let number: usize = parts.next()?.parse().ok()?;
            Input::GoTo(number.checked_sub(1)?)
        }
        "m" | "mark" => Input::Mark,
        "x" | "clear" => Input::Clear,
        "l" | "list" => Input::List,
        "s" | "submit" => Input::Submit,
        "q" | "quit" => Input::Quit,
        "?" | "h" | "help" => Input::Help,
        _ => return None,
    };
    Some(input)
}

/// Run a full session against stdin until it is submitted, abandoned or expires.
///
/// # Errors
///
/// Returns `AppError::Session` when the session cannot start and `AppError::Io`
/// when stdin fails.
pub async fn run(service: &AssessmentService) -> Result<(), crate::AppError> {
    let session = service.start_session().await?;
    println!(
        "{} questions, {} to finish. Type ? for help.",
        session.total_questions(),
        render::format_clock(session.remaining_seconds())
    );
    if session.dropped_questions() > 0 {
        println!(
            "Note: {} questions could not be prepared and were skipped.",
            session.dropped_questions()
        );
    }
    show_current(&session);

    let mut status = session.watch_status();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                if report_status(&current) {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    session.close();
                    println!("Input closed; nothing was saved.");
                    break;
                };
                if !handle_line(&session, &line).await {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Print a status change. Returns `true` once the session is over.
fn report_status(status: &SessionStatus) -> bool {
    match status {
        SessionStatus::InProgress => false,
        SessionStatus::Submitting => {
            println!("Submitting...");
            false
        }
        SessionStatus::Submitted(attempt) => {
            println!("\nAssessment saved.");
            println!("Total correct: {}", attempt.total_score());
            println!(
                "{}",
                render::score_table(&attempt.scores(), attempt.recommended_domain())
            );
            println!("Share id: {}", attempt.share_id());
            true
        }
        SessionStatus::SubmitFailed { reason } => {
            println!("Saving failed: {reason}");
            println!("Your answers are kept. Type s to try again.");
            false
        }
        SessionStatus::ReauthenticationRequired => {
            println!("You were signed out before the result was saved. Sign in and start again.");
            true
        }
        SessionStatus::Closed => true,
    }
}

/// Apply one line of input. Returns `false` when the loop should stop.
async fn handle_line(session: &AssessmentSession, line: &str) -> bool {
    let Some(input) = parse_input(line) else {
        if !line.trim().is_empty() {
            println!("Unknown command. Type ? for help.");
        }
        return true;
    };
    let current = session.current_index();

    let result = match input {
        Input::Answer(option) => session.select_answer(current, option).map(|()| {
            session.next();
        }),
        Input::Next => {
            session.next();
            Ok(())
        }
        Input::Previous => {
            session.previous();
            Ok(())
        }
        Input::GoTo(index) => session.go_to(index).map(|_| ()),
        Input::Mark => session.toggle_review(current).map(|_| ()),
        Input::Clear => session.clear_answer(current),
        Input::List => {
            show_palette(session);
            return true;
        }
        Input::Help => {
            println!("{}", render::HELP);
            return true;
        }
        Input::Quit => {
            session.close();
            println!("Session abandoned; nothing was saved.");
            return false;
        }
        Input::Submit => {
            let progress = session.progress();
            if progress.unanswered() > 0 {
                println!("{} questions are unanswered.", progress.unanswered());
            }
            // Success and failure both arrive on the status channel.
            if let Err(err) = session.submit(SubmitTrigger::Manual).await {
                debug!(error = %err, "manual submission did not complete");
            }
            return true;
        }
    };

    match result {
        Ok(()) => show_current(session),
        Err(SessionError::Completed) => println!("Time is up; answers are locked."),
        Err(err) => println!("{err}"),
    }
    true
}

fn show_current(session: &AssessmentSession) {
    let progress = session.progress();
    let Some(question) = session.question(progress.current) else {
        return;
    };
    print!(
        "{}",
        render::question_block(
            &question,
            &progress,
            session.selected_answer(progress.current),
            session.is_marked(progress.current),
        )
    );
}

fn show_palette(session: &AssessmentSession) {
    let total = session.total_questions();
    let statuses: Vec<QuestionStatus> = (0..total)
        .filter_map(|i| session.question_status(i).ok())
        .collect();
    let progress = session.progress();
    println!("{}", render::palette(&statuses, progress.current));
    println!("{}", render::progress_line(&progress));
}
