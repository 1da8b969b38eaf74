use assess_core::model::{Attempt, AttemptId, NewAttempt, Response, ShareId, UserId};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{attempt_id_from_i64, db, id_to_i64, map_attempt_row, map_response_row};
use crate::repository::{AttemptRepository, StorageError};

const ATTEMPT_COLUMNS: &str = r"
    id, user_id, share_id, programmer_score, analytics_score, tester_score,
    total_score, recommended_domain, completed_at
";

async fn insert_attempt_row(
    conn: &mut SqliteConnection,
    attempt: &NewAttempt,
) -> Result<Attempt, StorageError> {
    let share_id = ShareId::generate();
    let res = sqlx::query(
        r"
            INSERT INTO attempts (
                user_id, share_id, programmer_score, analytics_score, tester_score,
                total_score, recommended_domain, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ",
    )
    .bind(attempt.user_id.to_string())
    .bind(share_id.to_string())
    .bind(i64::from(attempt.scores.programmer))
    .bind(i64::from(attempt.scores.analytics))
    .bind(i64::from(attempt.scores.tester))
    .bind(i64::from(attempt.total_score()))
    .bind(attempt.recommended_domain().as_str())
    .bind(attempt.completed_at)
    .execute(&mut *conn)
    .await
    .map_err(db)?;

    let id = attempt_id_from_i64(res.last_insert_rowid())?;
    Ok(Attempt::created(id, share_id, attempt))
}

async fn insert_response_rows(
    conn: &mut SqliteConnection,
    attempt_id: AttemptId,
    responses: &[Response],
) -> Result<(), StorageError> {
    let attempt = id_to_i64("attempt_id", attempt_id.value())?;
    for response in responses {
        sqlx::query(
            r"
                INSERT INTO responses (attempt_id, question_id, selected_option, is_correct)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(attempt)
        .bind(id_to_i64("question_id", response.question_id.value())?)
        .bind(i64::from(response.selected_option))
        .bind(response.is_correct)
        .execute(&mut *conn)
        .await
        .map_err(db)?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn create_attempt(&self, attempt: &NewAttempt) -> Result<Attempt, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(db)?;
        insert_attempt_row(&mut conn, attempt).await
    }

    async fn insert_responses(
        &self,
        attempt_id: AttemptId,
        responses: &[Response],
    ) -> Result<(), StorageError> {
        // Surface a missing attempt as NotFound rather than a foreign key failure.
        self.get_attempt(attempt_id).await?;

        let mut tx = self.pool.begin().await.map_err(db)?;
        insert_response_rows(&mut tx, attempt_id, responses).await?;
        tx.commit().await.map_err(db)
    }

    async fn record_attempt(
        &self,
        attempt: &NewAttempt,
        responses: &[Response],
    ) -> Result<Attempt, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db)?;
        let stored = insert_attempt_row(&mut tx, attempt).await?;
        insert_response_rows(&mut tx, stored.id(), responses).await?;
        tx.commit().await.map_err(db)?;
        Ok(stored)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Attempt, StorageError> {
        let sql = format!("SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("attempt_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or(StorageError::NotFound)?;

        map_attempt_row(&row)
    }

    async fn find_by_share_id(&self, share_id: ShareId) -> Result<Option<Attempt>, StorageError> {
        let sql = format!("SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE share_id = ?1");
        let row = sqlx::query(&sql)
            .bind(share_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;

        row.as_ref().map(map_attempt_row).transpose()
    }

    async fn list_attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Attempt>, StorageError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE user_id = ?1 \
             ORDER BY completed_at DESC, id DESC LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }

    async fn list_responses(&self, attempt_id: AttemptId) -> Result<Vec<Response>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id, selected_option, is_correct
                FROM responses
                WHERE attempt_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("attempt_id", attempt_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_response_row(&row)?);
        }
        Ok(out)
    }
}
