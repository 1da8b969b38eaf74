use assess_core::model::{
    Attempt, AttemptId, Difficulty, Domain, DomainScores, OptionIndex, Question, QuestionId,
    Response, ShareId, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, keeping "no rows" distinguishable from connection trouble.
pub(crate) fn db(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::RowNotFound => StorageError::NotFound,
        other => StorageError::Connection(other.to_string()),
    }
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn uuid_from_str(field: &'static str, raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
}

pub(crate) fn attempt_id_from_i64(v: i64) -> Result<AttemptId, StorageError> {
    Ok(AttemptId::new(i64_to_u64("attempt_id", v)?))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = QuestionId::new(i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?);
    let options = [
        row.try_get::<String, _>("option_1").map_err(ser)?,
        row.try_get::<String, _>("option_2").map_err(ser)?,
        row.try_get::<String, _>("option_3").map_err(ser)?,
        row.try_get::<String, _>("option_4").map_err(ser)?,
    ];
    let correct_option =
        OptionIndex::new(row.try_get::<i64, _>("correct_option").map_err(ser)?).map_err(ser)?;
    let domain: Domain = row
        .try_get::<String, _>("domain")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let difficulty: Difficulty = row
        .try_get::<String, _>("difficulty")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    Ok(Question {
        id,
        text: row.try_get("question_text").map_err(ser)?,
        options,
        correct_option,
        domain,
        difficulty,
    })
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<Attempt, StorageError> {
    let id = attempt_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let user_raw: String = row.try_get("user_id").map_err(ser)?;
    let share_raw: String = row.try_get("share_id").map_err(ser)?;
    let scores = DomainScores::new(
        u32_from_i64(
            "programmer_score",
            row.try_get::<i64, _>("programmer_score").map_err(ser)?,
        )?,
        u32_from_i64(
            "analytics_score",
            row.try_get::<i64, _>("analytics_score").map_err(ser)?,
        )?,
        u32_from_i64("tester_score", row.try_get::<i64, _>("tester_score").map_err(ser)?)?,
    );
    let total = u32_from_i64("total_score", row.try_get::<i64, _>("total_score").map_err(ser)?)?;
    let recommended: Domain = row
        .try_get::<String, _>("recommended_domain")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    Attempt::from_persisted(
        id,
        UserId::new(uuid_from_str("user_id", &user_raw)?),
        ShareId::new(uuid_from_str("share_id", &share_raw)?),
        scores,
        total,
        recommended,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_response_row(row: &SqliteRow) -> Result<Response, StorageError> {
    Ok(Response {
        question_id: QuestionId::new(i64_to_u64(
            "question_id",
            row.try_get::<i64, _>("question_id").map_err(ser)?,
        )?),
        selected_option: OptionIndex::new(row.try_get::<i64, _>("selected_option").map_err(ser)?)
            .map_err(ser)?,
        is_correct: row.try_get::<bool, _>("is_correct").map_err(ser)?,
    })
}
