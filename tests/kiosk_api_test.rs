mod common;

use std::collections::HashSet;

use axum::http::StatusCode;
use serde_json::json;

use common::{seed_unit, spawn_app};

#[tokio::test]
async fn generation_scenario_over_http() {
    let app = spawn_app().await;
    let (subject_id, unit_id) = seed_unit(&app.pool, "英語", 3, 2, 1).await;

    let (status, body) = app
        .post_json(
            "/api/test_sheets",
            json!({ "subject_id": subject_id, "unit_id": unit_id, "difficulty": "easy", "question_count": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["difficulty"], "easy");
    let easy_id = body["id"].as_i64().unwrap();

    let (status, detail) = app.get(&format!("/api/test_sheets/{}", easy_id)).await;
    assert_eq!(status, StatusCode::OK);
    let questions = detail["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    let orders: Vec<i64> = questions.iter().map(|q| q["order"].as_i64().unwrap()).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert!(questions.iter().all(|q| q["difficulty"] == "easy"));
    assert!(questions.iter().all(|q| q.get("hint").is_none()));
    assert!(questions.iter().all(|q| q.get("answer_text").is_some()));

    let (status, body) = app
        .post_json(
            "/api/test_sheets",
            json!({ "unit_id": unit_id, "difficulty": "easy", "question_count": 4 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["available"], 3);
    assert_eq!(body["requested"], 4);

    let (status, body) = app
        .post_json(
            "/api/test_sheets",
            json!({ "unit_id": unit_id, "difficulty": "mix", "question_count": 5, "include_hint": true }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, detail) = app.get(&format!("/api/test_sheets/{}", body["id"])).await;
    let ids: HashSet<i64> = detail["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["question_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(detail["questions"][0]["hint"], "ヒント");

    let (_, listing) = app.get("/api/test_sheets").await;
    assert_eq!(listing["total"], 2);
    assert_eq!(listing["per_page"], 20);
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_generation() {
    let app = spawn_app().await;
    let (subject_id, unit_id) = seed_unit(&app.pool, "数学", 2, 0, 0).await;

    let (status, body) = app
        .post_json("/api/test_sheets", json!({ "unit_id": unit_id, "question_count": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["question_count"].is_array());

    let (status, body) = app
        .post_json("/api/test_sheets", json!({ "question_count": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["unit_id"].is_array());

    let (status, _) = app
        .post_json(
            "/api/test_sheets",
            json!({ "unit_id": unit_id, "difficulty": "impossible", "question_count": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/api/test_sheets",
            json!({ "subject_id": subject_id + 1, "unit_id": unit_id, "question_count": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json("/api/test_sheets", json!({ "unit_id": 9999, "question_count": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_sheets")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn availability_and_unit_listing() {
    let app = spawn_app().await;
    let (subject_id, unit_id) = seed_unit(&app.pool, "英語", 3, 2, 1).await;

    let (status, subjects) = app.get("/api/subjects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subjects[0]["name"], "英語");

    let (status, units) = app.get(&format!("/api/subjects/{}/units", subject_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(units[0]["question_count"], 6);
    assert_eq!(units[0]["grade_label"], "高1");
    assert_eq!(units[0]["question_counts_by_difficulty"]["normal"], 2);

    let (_, same) = app
        .get(&format!("/api/test_sheets/units_by_subject?subject_id={}", subject_id))
        .await;
    assert_eq!(same, units);

    let (status, avail) = app
        .get(&format!("/api/test_sheets/available_questions?unit_id={}&difficulty=hard", unit_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(avail["available_count"], 1);
    assert_eq!(avail["difficulty"], "hard");
    assert_eq!(avail["counts_by_difficulty"]["total"], 6);

    let (_, mix) = app
        .get(&format!("/api/test_sheets/available_questions?unit_id={}", unit_id))
        .await;
    assert_eq!(mix["difficulty"], "mix");
    assert_eq!(mix["available_count"], 6);

    let (status, _) = app
        .get(&format!("/api/test_sheets/available_questions?unit_id={}&difficulty=extreme", unit_id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/subjects/4242/units").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mark_printed_is_first_print_wins_and_feeds_history() {
    let app = spawn_app().await;
    let (_, unit_id) = seed_unit(&app.pool, "国語", 4, 0, 0).await;

    let (_, first) = app
        .post_json("/api/test_sheets", json!({ "unit_id": unit_id, "question_count": 2 }))
        .await;
    let (_, second) = app
        .post_json("/api/test_sheets", json!({ "unit_id": unit_id, "question_count": 2 }))
        .await;

    let (_, history) = app.get("/api/test_sheets/history").await;
    assert_eq!(history["total"], 0);

    let uri = format!("/api/test_sheets/{}/mark_printed", first["id"]);
    let (status, printed) = app.post_json(&uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(printed["success"], true);
    let (_, again) = app.post_json(&uri, json!({})).await;
    assert_eq!(printed["printed_at"], again["printed_at"]);

    let (_, history) = app.get("/api/test_sheets/history").await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["items"][0]["id"], first["id"]);
    assert_eq!(history["items"][0]["printed"], true);

    let (_, detail) = app.get(&format!("/api/test_sheets/{}", second["id"])).await;
    assert_eq!(detail["printed"], false);

    let (status, _) = app.post_json("/api/test_sheets/999/mark_printed", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_database() {
    let app = spawn_app().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
}
