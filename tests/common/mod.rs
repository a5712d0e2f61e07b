#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value as JsonValue;
use sqlx::SqlitePool;
use testsheet_backend::{
    database::pool::create_memory_pool,
    middleware::auth::AdminCredentials,
    routes::{router, RouterSettings},
    AppState,
};
use tower::ServiceExt;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "test-password";

pub struct TestApp {
    pub pool: SqlitePool,
    pub router: Router,
}

pub async fn spawn_app() -> TestApp {
    let pool = create_memory_pool().await.expect("memory pool");
    let settings = RouterSettings {
        admin: AdminCredentials::new(ADMIN_USER, ADMIN_PASSWORD),
        kiosk_rps: 1000,
        request_timeout: Duration::from_secs(10),
    };
    let router = router(AppState::new(pool.clone(), 9), settings);
    TestApp { pool, router }
}

pub fn admin_auth() -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", ADMIN_USER, ADMIN_PASSWORD))
    )
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let resp = self.router.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        (status, headers, bytes.to_vec())
    }

    pub async fn json(&self, req: Request<Body>) -> (StatusCode, JsonValue) {
        let (status, _, bytes) = self.send(req).await;
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, JsonValue) {
        self.json(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        self.json(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, admin_auth());
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.json(req).await
    }
}

/// Subject, unit and kept questions: `easy`, `normal` and `hard` of each level.
pub async fn seed_unit(pool: &SqlitePool, subject: &str, easy: usize, normal: usize, hard: usize) -> (i64, i64) {
    let now = chrono::Utc::now();
    let subject_id: i64 = sqlx::query_scalar(
        "INSERT INTO subjects (name, color_code, sort_order, created_at, updated_at)
         VALUES (?1, '#EF4444', 1, ?2, ?2) RETURNING id",
    )
    .bind(subject)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("subject");

    let unit_id: i64 = sqlx::query_scalar(
        "INSERT INTO units (subject_id, name, grade, sort_order, created_at, updated_at)
         VALUES (?1, 'Lesson 1-5', 1, 1, ?2, ?2) RETURNING id",
    )
    .bind(subject_id)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("unit");

    for (level, count) in [(1, easy), (2, normal), (3, hard)] {
        for i in 0..count {
            sqlx::query(
                "INSERT INTO questions (unit_id, question_type, difficulty, question_text, answer_text, hint, created_at, updated_at)
                 VALUES (?1, 0, ?2, ?3, ?4, 'ヒント', ?5, ?5)",
            )
            .bind(unit_id)
            .bind(level)
            .bind(format!("q{}-{}", level, i))
            .bind(format!("a{}-{}", level, i))
            .bind(now)
            .execute(pool)
            .await
            .expect("question");
        }
    }
    (subject_id, unit_id)
}
