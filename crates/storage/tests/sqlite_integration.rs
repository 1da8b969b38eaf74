use assess_core::model::{
    AttemptId, Difficulty, Domain, DomainScores, NewAttempt, OptionIndex, QuestionDraft,
    QuestionId, QuestionKey, Response, ShareId, UserId,
};
use assess_core::Clock;
use assess_core::time::fixed_now;
use chrono::{DateTime, Duration, Utc};
use storage::repository::{AttemptRepository, QuestionRepository, StorageError};
use storage::sqlite::SqliteRepository;
use uuid::Uuid;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn draft(text: &str, domain: Domain) -> QuestionDraft {
    QuestionDraft::new(
        text,
        ["first", "second", "third", "fourth"],
        2,
        domain,
        Difficulty::Medium,
    )
}

fn user(n: u128) -> UserId {
    UserId::new(Uuid::from_u128(n))
}

#[tokio::test]
async fn sqlite_question_insert_is_idempotent_by_normalized_text() {
    let repo = connect("memdb_question_dedupe").await;

    let first = repo
        .insert_question(draft("What does SQL stand for?", Domain::Analytics).validate().unwrap())
        .await
        .expect("insert");
    let again = repo
        .insert_question(
            draft("  what does sql   STAND for? ", Domain::Analytics)
                .validate()
                .unwrap(),
        )
        .await
        .expect("insert again");

    assert_eq!(first.id, again.id);
    assert_eq!(again.text, "What does SQL stand for?");
    assert_eq!(again.correct_option, OptionIndex::new(2).unwrap());
    assert_eq!(again.domain, Domain::Analytics);

    let listed = repo.list_questions(10).await.expect("list");
    assert_eq!(listed.len(), 1);

    let found = repo
        .find_question_by_key(&QuestionKey::from_text("WHAT DOES SQL STAND FOR?"))
        .await
        .expect("find");
    assert_eq!(found.map(|q| q.id), Some(first.id));

    let missing = repo
        .find_question_by_key(&QuestionKey::from_text("never stored"))
        .await
        .expect("find missing");
    assert!(missing.is_none());
}

#[tokio::test]
async fn sqlite_list_questions_honours_limit() {
    let repo = connect("memdb_question_limit").await;
    for i in 0..12 {
        repo.insert_question(
            draft(&format!("Question number {i}?"), Domain::Programmer)
                .validate()
                .unwrap(),
        )
        .await
        .unwrap();
    }

    assert_eq!(repo.list_questions(5).await.unwrap().len(), 5);
    assert_eq!(repo.list_questions(100).await.unwrap().len(), 12);
}

#[tokio::test]
async fn sqlite_record_attempt_persists_scores_and_responses() {
    let repo = connect("memdb_attempt_roundtrip").await;
    let q1 = repo
        .insert_question(draft("Q one?", Domain::Programmer).validate().unwrap())
        .await
        .unwrap();
    let q2 = repo
        .insert_question(draft("Q two?", Domain::Tester).validate().unwrap())
        .await
        .unwrap();

    let attempt = NewAttempt {
        user_id: user(1),
        scores: DomainScores::new(1, 0, 0),
        completed_at: fixed_now(),
    };
    let responses = [
        Response {
            question_id: q1.id,
            selected_option: OptionIndex::new(2).unwrap(),
            is_correct: true,
        },
        Response {
            question_id: q2.id,
            selected_option: OptionIndex::new(4).unwrap(),
            is_correct: false,
        },
    ];

    let stored = repo
        .record_attempt(&attempt, &responses)
        .await
        .expect("record");
    assert_eq!(stored.total_score(), 1);
    assert_eq!(stored.recommended_domain(), Domain::Programmer);

    let fetched = repo.get_attempt(stored.id()).await.expect("get");
    assert_eq!(fetched, stored);

    let shared = repo
        .find_by_share_id(stored.share_id())
        .await
        .expect("share lookup");
    assert_eq!(shared, Some(stored.clone()));

    let persisted = repo.list_responses(stored.id()).await.expect("responses");
    assert_eq!(persisted, responses.to_vec());
}

#[tokio::test]
async fn sqlite_record_attempt_rolls_back_on_bad_response() {
    let repo = connect("memdb_attempt_rollback").await;
    let attempt = NewAttempt {
        user_id: user(2),
        scores: DomainScores::new(0, 0, 0),
        completed_at: fixed_now(),
    };
    let orphan = Response {
        question_id: QuestionId::new(4242),
        selected_option: OptionIndex::new(1).unwrap(),
        is_correct: false,
    };

    let err = repo
        .record_attempt(&attempt, &[orphan])
        .await
        .expect_err("foreign key must reject");
    assert!(matches!(err, StorageError::Connection(_)));

    let history = repo.list_attempts_for_user(user(2), 10).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn sqlite_history_is_newest_first_and_scoped_to_user() {
    let repo = connect("memdb_attempt_history").await;
    let base = fixed_now();

    for (offset, who) in [(0, 1), (2, 1), (1, 1), (3, 2)] {
        repo.create_attempt(&NewAttempt {
            user_id: user(who),
            scores: DomainScores::new(0, u32::try_from(offset).unwrap(), 0),
            completed_at: base + Duration::minutes(offset),
        })
        .await
        .unwrap();
    }

    let history = repo.list_attempts_for_user(user(1), 10).await.unwrap();
    let minutes: Vec<i64> = history
        .iter()
        .map(|a| (a.completed_at() - base).num_minutes())
        .collect();
    assert_eq!(minutes, vec![2, 1, 0]);

    let limited = repo.list_attempts_for_user(user(1), 2).await.unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn sqlite_missing_rows_surface_as_not_found() {
    let repo = connect("memdb_attempt_missing").await;

    let err = repo.get_attempt(AttemptId::new(77)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let err = repo
        .insert_responses(AttemptId::new(77), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let none = repo.find_by_share_id(ShareId::generate()).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn sqlite_migrate_is_repeatable() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.insert_question(draft("Still works?", Domain::Tester).validate().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn sqlite_rows_are_stamped_with_the_repository_clock() {
    let url = "sqlite:file:memdb_clock_stamp?mode=memory&cache=shared";
    let repo = SqliteRepository::connect(url)
        .await
        .expect("connect")
        .with_clock(Clock::fixed(fixed_now()));
    repo.migrate().await.expect("migrate");

    repo.insert_question(draft("Which clock stamped me?", Domain::Tester).validate().unwrap())
        .await
        .expect("insert");

    let created: DateTime<Utc> = sqlx::query_scalar("SELECT created_at FROM questions")
        .fetch_one(repo.pool())
        .await
        .expect("created_at");
    assert_eq!(created, fixed_now());

    let applied: DateTime<Utc> =
        sqlx::query_scalar("SELECT applied_at FROM schema_migrations WHERE version = 1")
            .fetch_one(repo.pool())
            .await
            .expect("applied_at");
    assert_eq!(applied, fixed_now());
}
