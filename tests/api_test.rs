//! End-to-end flow over the HTTP surface: a visitor views a published quiz,
//! answers, hands over contact details, and completes into a scored result.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{create_test_db, test_state};
use leadquiz::db::{Db, QuizPatch};
use leadquiz::db::models::QuizSettings;

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(match &body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

struct Fixture {
    quiz_id: i64,
    q1_answers: (i64, i64),
    q2_answers: (i64, i64),
}

/// Two questions, two answers each; "Leader" needs a score of 2 and is a
/// lead result, "Follower" catches everything below.
async fn seed_quiz(db: &Db) -> Fixture {
    let quiz = db
        .create_quiz(
            "What Leader Are You?",
            None,
            None,
            "what-leader-are-you",
            QuizSettings::default(),
        )
        .await
        .unwrap();
    db.update_quiz(
        quiz.id,
        QuizPatch {
            is_published: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let leader = db
        .create_result(quiz.id, "Leader", None, None, None, true, 2.0)
        .await
        .unwrap();
    let follower = db
        .create_result(quiz.id, "Follower", None, None, None, false, 0.0)
        .await
        .unwrap();

    let q1 = db.create_question(quiz.id, "In a group you...", None).await.unwrap();
    let q1a1 = db.create_answer(q1.id, "Take charge").await.unwrap();
    let q1a2 = db.create_answer(q1.id, "Wait and see").await.unwrap();
    let q2 = db.create_question(quiz.id, "Decisions are...", None).await.unwrap();
    let q2a1 = db.create_answer(q2.id, "Mine to make").await.unwrap();
    let q2a2 = db.create_answer(q2.id, "Made together").await.unwrap();

    for answer_id in [q1a1.id, q2a1.id] {
        db.upsert_answer_weight(answer_id, leader.id, 1.0).await.unwrap();
    }
    for answer_id in [q1a2.id, q2a2.id] {
        db.upsert_answer_weight(answer_id, follower.id, 1.0).await.unwrap();
    }

    Fixture {
        quiz_id: quiz.id,
        q1_answers: (q1a1.id, q1a2.id),
        q2_answers: (q2a1.id, q2a2.id),
    }
}

#[tokio::test]
async fn full_quiz_flow_scores_and_captures_a_lead() {
    let db = create_test_db().await;
    let fixture = seed_quiz(&db).await;
    let app = leadquiz::router(test_state(db.clone()));

    // Published quiz is readable by slug.
    let (status, quiz) = send(&app, Method::GET, "/q/what-leader-are-you", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 2);
    assert_eq!(quiz["quiz_results"].as_array().unwrap().len(), 2);

    // Landing on the quiz creates a viewed session.
    let (status, session) = send(
        &app,
        Method::POST,
        "/sessions",
        Some(json!({ "quiz_id": fixture.quiz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["status"], "viewed");
    let session_id = session["id"].as_i64().unwrap();

    let questions = quiz["questions"].as_array().unwrap();
    let q1_id = questions[0]["id"].as_i64().unwrap();
    let q2_id = questions[1]["id"].as_i64().unwrap();

    // First answer promotes the session to started.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/sessions/{session_id}/respond"),
        Some(json!({ "question_id": q1_id, "answer_id": fixture.q1_answers.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, session) =
        send(&app, Method::GET, &format!("/sessions/{session_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["status"], "started");
    assert!(session["started_at"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/sessions/{session_id}/respond"),
        Some(json!({ "question_id": q2_id, "answer_id": fixture.q2_answers.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Lead capture, then attach the user to the session.
    let (status, lead) = send(
        &app,
        Method::POST,
        "/users/lead",
        Some(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = lead["user_id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/sessions/{session_id}"),
        Some(json!({ "user_id": user_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Completion resolves "Leader" with a score of 2; email delivery is
    // unconfigured so emailSent stays false.
    let (status, outcome) = send(
        &app,
        Method::POST,
        &format!("/sessions/{session_id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["totalScore"], 2.0);
    assert_eq!(outcome["primaryResult"]["title"], "Leader");
    assert_eq!(outcome["isLead"], true);
    assert_eq!(outcome["emailSent"], false);
    assert!(outcome["emailError"].is_null());
    assert_eq!(outcome["session"]["status"], "completed");
    assert_eq!(outcome["session"]["user_id"], user_id);

    // Re-completing recomputes idempotently: still one primary row.
    let (status, outcome) = send(
        &app,
        Method::POST,
        &format!("/sessions/{session_id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["totalScore"], 2.0);
    let rows = db.session_results_for(session_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_primary);
}

#[tokio::test]
async fn resubmitting_an_answer_keeps_one_row_with_the_later_answer() {
    let db = create_test_db().await;
    let fixture = seed_quiz(&db).await;
    let app = leadquiz::router(test_state(db.clone()));

    let (_, session) = send(
        &app,
        Method::POST,
        "/sessions",
        Some(json!({ "quiz_id": fixture.quiz_id })),
    )
    .await;
    let session_id = session["id"].as_i64().unwrap();

    let q1 = db.questions_for_quiz(fixture.quiz_id).await.unwrap()[0].id;
    for answer_id in [fixture.q1_answers.0, fixture.q1_answers.1] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/sessions/{session_id}/respond"),
            Some(json!({ "question_id": q1, "answer_id": answer_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let responses = db.responses_for_session(session_id).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].answer_id, fixture.q1_answers.1);
}

#[tokio::test]
async fn completion_without_user_still_computes_lead_flag() {
    let db = create_test_db().await;
    let fixture = seed_quiz(&db).await;
    let app = leadquiz::router(test_state(db.clone()));

    let (_, session) = send(
        &app,
        Method::POST,
        "/sessions",
        Some(json!({ "quiz_id": fixture.quiz_id })),
    )
    .await;
    let session_id = session["id"].as_i64().unwrap();

    let questions = db.questions_for_quiz(fixture.quiz_id).await.unwrap();
    send(
        &app,
        Method::POST,
        &format!("/sessions/{session_id}/respond"),
        Some(json!({ "question_id": questions[0].id, "answer_id": fixture.q1_answers.0 })),
    )
    .await;
    send(
        &app,
        Method::POST,
        &format!("/sessions/{session_id}/respond"),
        Some(json!({ "question_id": questions[1].id, "answer_id": fixture.q2_answers.0 })),
    )
    .await;

    let (status, outcome) = send(
        &app,
        Method::POST,
        &format!("/sessions/{session_id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["isLead"], true);
    assert!(outcome["session"]["user_id"].is_null());
    assert_eq!(outcome["emailSent"], false);
}

#[tokio::test]
async fn lead_capture_dedupes_case_insensitively() {
    let db = create_test_db().await;
    let app = leadquiz::router(test_state(db.clone()));

    let (status, first) = send(
        &app,
        Method::POST,
        "/users/lead",
        Some(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "Ada@Example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = send(
        &app,
        Method::POST,
        "/users/lead",
        Some(json!({
            "firstName": "Augusta",
            "lastName": "King",
            "email": "ada@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user_id"], second["user_id"]);

    let user = db
        .get_user(first["user_id"].as_i64().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name.as_deref(), Some("Augusta King"));
    assert_eq!(user.email.as_deref(), Some("Ada@Example.com"));
}

#[tokio::test]
async fn lead_capture_requires_every_field() {
    let db = create_test_db().await;
    let app = leadquiz::router(test_state(db));

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/lead",
        Some(json!({ "firstName": "Ada", "lastName": "", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn oauth_exchange_requires_a_token() {
    let db = create_test_db().await;
    let app = leadquiz::router(test_state(db));

    let (status, body) = send(&app, Method::POST, "/auth/exchange", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "token is required");
}

#[tokio::test]
async fn unpublished_quiz_is_not_readable_by_slug() {
    let db = create_test_db().await;
    db.create_quiz("Draft", None, None, "draft", QuizSettings::default())
        .await
        .unwrap();
    let app = leadquiz::router(test_state(db));

    let (status, _) = send(&app, Method::GET, "/q/draft", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
