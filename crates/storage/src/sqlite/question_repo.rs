use assess_core::model::{Question, QuestionKey, ValidatedQuestion};

use super::SqliteRepository;
use super::mapping::{db, map_question_row};
use crate::repository::{QuestionRepository, StorageError};

const QUESTION_COLUMNS: &str = r"
    id, question_text, option_1, option_2, option_3, option_4,
    correct_option, domain, difficulty
";

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn list_questions(&self, limit: u32) -> Result<Vec<Question>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY RANDOM() LIMIT ?1");
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }

    async fn find_question_by_key(
        &self,
        key: &QuestionKey,
    ) -> Result<Option<Question>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE normalized_text = ?1");
        let row = sqlx::query(&sql)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        let key = question.key();
        let [option_1, option_2, option_3, option_4] = &question.options;

        // A concurrent insert of the same text loses the race silently and reads the winner.
        sqlx::query(
            r"
            INSERT INTO questions (
                question_text, normalized_text, option_1, option_2, option_3, option_4,
                correct_option, domain, difficulty, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(normalized_text) DO NOTHING
            ",
        )
        .bind(&question.text)
        .bind(key.as_str())
        .bind(option_1)
        .bind(option_2)
        .bind(option_3)
        .bind(option_4)
        .bind(i64::from(question.correct_option))
        .bind(question.domain.as_str())
        .bind(question.difficulty.as_str())
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        self.find_question_by_key(&key)
            .await?
            .ok_or(StorageError::Conflict)
    }
}
