//! Data-layer invariants: upsert semantics, status promotion, idempotent
//! result replacement, and the analytics counts.

mod common;

use common::create_test_db;
use leadquiz::db::models::{QuizSettings, SessionStatus};
use leadquiz::db::{Db, SessionPatch};

async fn seed_minimal(db: &Db) -> (i64, i64, i64) {
    let quiz = db
        .create_quiz("Quiz", None, None, "quiz", QuizSettings::default())
        .await
        .unwrap();
    let question = db.create_question(quiz.id, "Q?", None).await.unwrap();
    let answer = db.create_answer(question.id, "A").await.unwrap();
    (quiz.id, question.id, answer.id)
}

#[tokio::test]
async fn first_response_promotes_viewed_to_started_only_once() {
    let db = create_test_db().await;
    let (quiz_id, question_id, answer_id) = seed_minimal(&db).await;

    let session = db.create_session(quiz_id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Viewed);
    assert!(!session.anonymous_token.is_empty());
    assert!(session.started_at.is_none());

    db.upsert_response(session.id, question_id, answer_id)
        .await
        .unwrap();
    let session = db.get_session(session.id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Started);
    let first_started_at = session.started_at.unwrap();

    // A later answer must not rewind or restamp the transition.
    db.upsert_response(session.id, question_id, answer_id)
        .await
        .unwrap();
    let session = db.get_session(session.id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Started);
    assert_eq!(session.started_at.unwrap(), first_started_at);
}

#[tokio::test]
async fn response_upsert_keeps_one_row_per_question() {
    let db = create_test_db().await;
    let (quiz_id, question_id, answer_id) = seed_minimal(&db).await;
    let other_answer = db.create_answer(question_id, "B").await.unwrap();

    let session = db.create_session(quiz_id).await.unwrap();
    db.upsert_response(session.id, question_id, answer_id)
        .await
        .unwrap();
    db.upsert_response(session.id, question_id, other_answer.id)
        .await
        .unwrap();

    let responses = db.responses_for_session(session.id).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].answer_id, other_answer.id);
}

#[tokio::test]
async fn replace_session_result_is_idempotent() {
    let db = create_test_db().await;
    let (quiz_id, _, _) = seed_minimal(&db).await;
    let result = db
        .create_result(quiz_id, "R", None, None, None, false, 0.0)
        .await
        .unwrap();
    let session = db.create_session(quiz_id).await.unwrap();

    db.replace_session_result(session.id, Some((result.id, 3.0)))
        .await
        .unwrap();
    db.replace_session_result(session.id, Some((result.id, 5.0)))
        .await
        .unwrap();

    let rows = db.session_results_for(session.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].score, 5.0);
    assert!(rows[0].is_primary);

    // No primary at all clears the table for the session.
    db.replace_session_result(session.id, None).await.unwrap();
    assert!(db.session_results_for(session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn answer_weight_upsert_overwrites_in_place() {
    let db = create_test_db().await;
    let (quiz_id, _, answer_id) = seed_minimal(&db).await;
    let result = db
        .create_result(quiz_id, "R", None, None, None, false, 0.0)
        .await
        .unwrap();

    let first = db.upsert_answer_weight(answer_id, result.id, 1.0).await.unwrap();
    let second = db.upsert_answer_weight(answer_id, result.id, 2.5).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.weight, 2.5);

    let weights = {
        let session = db.create_session(quiz_id).await.unwrap();
        let question = db.questions_for_quiz(quiz_id).await.unwrap()[0].id;
        db.upsert_response(session.id, question, answer_id).await.unwrap();
        db.response_weights(session.id).await.unwrap()
    };
    assert_eq!(weights.len(), 1);
    assert_eq!(weights[0].weight, 2.5);
}

#[tokio::test]
async fn attached_user_survives_completion() {
    let db = create_test_db().await;
    let (quiz_id, _, _) = seed_minimal(&db).await;
    let user = db.create_lead_user("ada@example.com", "Ada").await.unwrap();
    let session = db.create_session(quiz_id).await.unwrap();

    db.update_session(
        session.id,
        SessionPatch {
            user_id: Some(user.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let session = db.mark_completed(session.id, 1.0, true).await.unwrap().unwrap();
    assert_eq!(session.user_id, Some(user.id));
    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.is_lead);
    assert_eq!(session.lead_score, Some(1.0));
}

#[tokio::test]
async fn oauth_user_upsert_is_keyed_on_provider_id() {
    let db = create_test_db().await;

    let first = db
        .upsert_oauth_user(
            "user-live-123",
            Some("ada@example.com"),
            Some("Ada Lovelace"),
            Some("https://img.example.com/ada.png"),
        )
        .await
        .unwrap();

    // Repeat login: new values win, absent values keep what is stored.
    let second = db
        .upsert_oauth_user("user-live-123", Some("ada@new.example.com"), None, None)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.email.as_deref(), Some("ada@new.example.com"));
    assert_eq!(second.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(
        second.profile_picture_url.as_deref(),
        Some("https://img.example.com/ada.png")
    );

    let other = db
        .upsert_oauth_user("user-live-456", None, None, None)
        .await
        .unwrap();
    assert_ne!(other.id, first.id);
}

#[tokio::test]
async fn funnel_counts_track_the_lifecycle() {
    let db = create_test_db().await;
    let (quiz_id, question_id, answer_id) = seed_minimal(&db).await;

    // One viewed-only, one started, one completed lead.
    db.create_session(quiz_id).await.unwrap();

    let started = db.create_session(quiz_id).await.unwrap();
    db.upsert_response(started.id, question_id, answer_id)
        .await
        .unwrap();

    let completed = db.create_session(quiz_id).await.unwrap();
    db.upsert_response(completed.id, question_id, answer_id)
        .await
        .unwrap();
    db.mark_completed(completed.id, 2.0, true).await.unwrap();

    assert_eq!(db.sessions_viewed_count(quiz_id).await.unwrap(), 3);
    assert_eq!(db.sessions_started_count(quiz_id).await.unwrap(), 2);
    assert_eq!(db.sessions_completed_count(quiz_id).await.unwrap(), 1);
    assert_eq!(db.sessions_lead_count(quiz_id).await.unwrap(), 1);
}

#[tokio::test]
async fn result_distribution_counts_primary_results_of_completed_sessions() {
    let db = create_test_db().await;
    let (quiz_id, question_id, answer_id) = seed_minimal(&db).await;
    let winner = db
        .create_result(quiz_id, "Winner", None, None, None, false, 0.0)
        .await
        .unwrap();

    for _ in 0..2 {
        let session = db.create_session(quiz_id).await.unwrap();
        db.upsert_response(session.id, question_id, answer_id)
            .await
            .unwrap();
        db.replace_session_result(session.id, Some((winner.id, 1.0)))
            .await
            .unwrap();
        db.mark_completed(session.id, 1.0, false).await.unwrap();
    }

    // A session with a stored result but never completed does not count.
    let dangling = db.create_session(quiz_id).await.unwrap();
    db.replace_session_result(dangling.id, Some((winner.id, 1.0)))
        .await
        .unwrap();

    let distribution = db.result_distribution(quiz_id).await.unwrap();
    assert_eq!(distribution.len(), 1);
    assert_eq!(distribution[0].result, "Winner");
    assert_eq!(distribution[0].count, 2);
}

#[tokio::test]
async fn migrations_are_recorded_and_rerunnable() {
    let db = create_test_db().await;
    assert!(db.migration_applied("V1").await.unwrap());
    assert!(db.migration_applied("V2").await.unwrap());
    assert!(!db.migration_applied("V999").await.unwrap());

    let settings = db.get_app_settings().await.unwrap();
    assert_eq!(settings.id, 1);
}
