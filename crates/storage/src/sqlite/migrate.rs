use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the schema migrations that have not been applied yet.
///
/// Version 1 creates questions (unique by normalized text), attempts and responses.
pub async fn run_migrations(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id INTEGER PRIMARY KEY,
                    question_text TEXT NOT NULL,
                    normalized_text TEXT NOT NULL UNIQUE,
                    option_1 TEXT NOT NULL,
                    option_2 TEXT NOT NULL,
                    option_3 TEXT NOT NULL,
                    option_4 TEXT NOT NULL,
                    correct_option INTEGER NOT NULL CHECK (correct_option BETWEEN 1 AND 4),
                    domain TEXT NOT NULL CHECK (domain IN ('programmer', 'analytics', 'tester')),
                    difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'hard')),
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS attempts (
                    id INTEGER PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    share_id TEXT NOT NULL UNIQUE,
                    programmer_score INTEGER NOT NULL CHECK (programmer_score >= 0),
                    analytics_score INTEGER NOT NULL CHECK (analytics_score >= 0),
                    tester_score INTEGER NOT NULL CHECK (tester_score >= 0),
                    total_score INTEGER NOT NULL
                        CHECK (total_score = programmer_score + analytics_score + tester_score),
                    recommended_domain TEXT NOT NULL
                        CHECK (recommended_domain IN ('programmer', 'analytics', 'tester')),
                    completed_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS responses (
                    id INTEGER PRIMARY KEY,
                    attempt_id INTEGER NOT NULL,
                    question_id INTEGER NOT NULL,
                    selected_option INTEGER NOT NULL CHECK (selected_option BETWEEN 1 AND 4),
                    is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                    UNIQUE (attempt_id, question_id),
                    FOREIGN KEY (attempt_id) REFERENCES attempts(id) ON DELETE CASCADE,
                    FOREIGN KEY (question_id) REFERENCES questions(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_attempts_user_completed
                    ON attempts (user_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_responses_attempt
                    ON responses (attempt_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
