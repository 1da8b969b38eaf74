use std::sync::Arc;

use assess_core::model::{ShareId, UserId};
use clap::{Args, Parser, Subcommand};
use services::{
    AppServices, AppServicesError, AssessmentConfig, Clock, ConfigError, SessionError,
    StaticIdentity,
};
use storage::repository::StorageError;
use thiserror::Error;
use tracing::info;

mod db;
mod render;
mod take;
mod telemetry;

use db::DbUrlError;
use telemetry::TelemetryError;

/// Timed career assessment in the terminal.
#[derive(Debug, Parser)]
#[command(name = "assess", about = "Timed career assessment", version)]
struct Cli {
    /// `SQLite` URL or file path.
    #[arg(long, global = true, env = "ASSESS_DB_URL", default_value = "sqlite:assess.sqlite3")]
    db: String,

    /// Signed-in user id (UUID).
    #[arg(long, global = true, env = "ASSESS_USER_ID")]
    user: Option<UserId>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store the built-in question bank.
    Seed,
    /// Take a timed assessment.
    Take,
    /// List your finished attempts, newest first.
    History(HistoryArgs),
    /// Show a shared result.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct HistoryArgs {
    /// How many attempts to list.
    #[arg(long, default_value_t = 10)]
    limit: u32,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Share id printed after submission.
    share_id: ShareId,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Db(#[from] DbUrlError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Services(#[from] AppServicesError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("stdin: {0}")]
    Io(#[from] std::io::Error),
    #[error("no user: pass --user or set ASSESS_USER_ID")]
    MissingUser,
}

async fn run(cli: Cli) -> Result<(), AppError> {
    telemetry::init()?;

    let db_url = db::normalize_sqlite_url(&cli.db);
    db::prepare_sqlite_file(&db_url)?;
    let config = AssessmentConfig::from_env()?;
    let identity = Arc::new(StaticIdentity::new(cli.user));
    let services = AppServices::new_sqlite(&db_url, Clock::default(), config, identity).await?;
    info!(db = %db_url, generator = services.generator_enabled(), "services ready");

    match cli.command {
        Command::Seed => {
            let report = services.seed_templates().await?;
            println!(
                "seeded {} questions ({} already present, {} invalid)",
                report.inserted, report.existing, report.invalid
            );
        }
        Command::Take => take::run(&services.assessment()).await?,
        Command::History(args) => {
            let user = cli.user.ok_or(AppError::MissingUser)?;
            let items = services.history().list_for_user(user, args.limit).await?;
            if items.is_empty() {
                println!("no attempts yet");
            }
            for item in &items {
                println!("{}", render::history_line(item));
            }
        }
        Command::Show(args) => match services.history().public_result(args.share_id).await? {
            Some(result) => println!("{}", render::public_result(&result)),
            None => println!("no result for {}", args.share_id),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // A missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn history_takes_a_limit_and_global_flags() {
        let user = uuid::Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "assess",
            "history",
            "--limit",
            "3",
            "--user",
            &user.to_string(),
            "--db",
            "sqlite::memory:",
        ])
        .unwrap();

        assert_eq!(cli.db, "sqlite::memory:");
        assert_eq!(cli.user, Some(UserId::new(user)));
        assert!(matches!(cli.command, Command::History(HistoryArgs { limit: 3 })));
    }

    #[test]
    fn show_rejects_malformed_share_ids() {
        assert!(Cli::try_parse_from(["assess", "show", "not-a-uuid"]).is_err());

        let share = ShareId::new(uuid::Uuid::new_v4());
        let cli = Cli::try_parse_from(["assess", "show", &share.to_string()]).unwrap();
        assert!(matches!(cli.command, Command::Show(ShowArgs { share_id }) if share_id == share));
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(Cli::try_parse_from(["assess"]).is_err());
    }
}
