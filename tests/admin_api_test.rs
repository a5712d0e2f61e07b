mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value as JsonValue};

use common::{admin_auth, seed_unit, spawn_app};

fn multipart_csv(csv: &str) -> Request<Body> {
    let boundary = "testsheetboundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"questions.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
        b = boundary,
        csv = csv
    );
    Request::builder()
        .method("POST")
        .uri("/api/admin/questions/import")
        .header(header::AUTHORIZATION, admin_auth())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn admin_routes_require_basic_auth() {
    let app = spawn_app().await;

    let (status, headers, _) = app
        .send(
            Request::builder()
                .uri("/api/admin/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(headers.get(header::WWW_AUTHENTICATE).is_some());

    let (status, _, _) = app
        .send(
            Request::builder()
                .uri("/api/admin/dashboard")
                .header(header::AUTHORIZATION, "Basic YWRtaW46d3Jvbmc=")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.admin("GET", "/api/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn catalog_crud_flow() {
    let app = spawn_app().await;

    let (status, subject) = app
        .admin("POST", "/api/admin/subjects", Some(json!({ "name": "理科", "sort_order": 3 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subject["color_code"], "#8B5CF6");
    let subject_id = subject["id"].as_i64().unwrap();

    let (status, _) = app
        .admin("POST", "/api/admin/subjects", Some(json!({ "name": "理科" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .admin(
            "POST",
            "/api/admin/units",
            Some(json!({ "subject_id": subject_id, "name": "化学基礎", "grade": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, unit) = app
        .admin(
            "POST",
            "/api/admin/units",
            Some(json!({ "subject_id": subject_id, "name": "化学基礎", "grade": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let unit_id = unit["id"].as_i64().unwrap();

    let (status, renamed) = app
        .admin("PATCH", &format!("/api/admin/units/{}", unit_id), Some(json!({ "name": "化学" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "化学");
    assert_eq!(renamed["grade"], 2);

    let (status, question) = app
        .admin(
            "POST",
            "/api/admin/questions",
            Some(json!({
                "unit_id": unit_id,
                "question_type": "sentence",
                "difficulty": "normal",
                "question_text": "水の化学式は？",
                "answer_text": "H2O"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(question["difficulty_label"], "普通");
    let question_id = question["id"].as_i64().unwrap();

    let (status, _) = app
        .admin("DELETE", &format!("/api/admin/questions/{}", question_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .admin("GET", &format!("/api/admin/questions/{}", question_id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, restored) = app
        .admin("POST", &format!("/api/admin/questions/{}/restore", question_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["discarded"], false);

    let (_, listing) = app
        .admin("GET", &format!("/api/admin/questions?unit_id={}&keyword=H2O", unit_id), None)
        .await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["per_page"], 50);

    let (status, _) = app
        .admin("GET", "/api/admin/questions?difficulty=brutal", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn csv_import_reports_rows_and_export_round_trips() {
    let app = spawn_app().await;
    let (subject_id, unit_id) = seed_unit(&app.pool, "英語", 0, 0, 0).await;

    let csv = format!(
        "subject_id,unit_id,question_type,difficulty,question_text,answer_text,hint,answer_note\n\
         {s},{u},word,easy,apple,りんご,,\n\
         {s},{u},word,hard,orange,オレンジ,果物,\n",
        s = subject_id,
        u = unit_id
    );
    let (status, _, bytes) = app.send(multipart_csv(&csv)).await;
    assert_eq!(status, StatusCode::OK);
    let result: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(result["success_count"], 2);
    assert_eq!(result["errors"], json!([]));

    let bad = format!(
        "unit_id,question_text,answer_text\n{u},grape,ぶどう\n{u},,missing\n",
        u = unit_id
    );
    let (status, _, bytes) = app.send(multipart_csv(&bad)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let result: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(result["success_count"], 1);
    assert_eq!(result["errors"][0]["row"], 3);

    let (status, headers, bytes) = app
        .send(
            Request::builder()
                .uri(format!("/api/admin/questions/export?unit_id={}", unit_id))
                .header(header::AUTHORIZATION, admin_auth())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename=\"questions_"));
    assert!(disposition.ends_with(".csv\""));
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.starts_with("subject_id,unit_id,question_type,difficulty"));
    assert!(text.contains("orange,オレンジ,果物"));
}

#[tokio::test]
async fn dashboard_and_sheet_discard() {
    let app = spawn_app().await;
    let (_, unit_id) = seed_unit(&app.pool, "社会", 2, 1, 0).await;

    let (_, sheet) = app
        .post_json("/api/test_sheets", json!({ "unit_id": unit_id, "question_count": 3 }))
        .await;

    let (_, stats) = app.admin("GET", "/api/admin/dashboard", None).await;
    assert_eq!(stats["total_questions"], 3);
    assert_eq!(stats["total_test_sheets"], 1);
    assert_eq!(stats["questions_by_difficulty"]["easy"], 2);
    assert_eq!(stats["questions_by_subject"][0]["subject_name"], "社会");
    assert_eq!(stats["recent_test_sheets"][0]["id"], sheet["id"]);

    let (status, _) = app
        .admin("DELETE", &format!("/api/admin/test_sheets/{}", sheet["id"]), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/test_sheets/{}", sheet["id"])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, stats) = app.admin("GET", "/api/admin/dashboard", None).await;
    assert_eq!(stats["total_test_sheets"], 0);
}
