//! Fixtures shared by the service unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::SqlitePool;

use crate::database::pool::create_memory_pool;
use crate::models::question::Difficulty;

static SUBJECT_SEQ: AtomicUsize = AtomicUsize::new(1);

pub async fn setup_test_db() -> SqlitePool {
    create_memory_pool().await.expect("Failed to create test pool")
}

pub struct SeededUnit {
    pub subject_id: i64,
    pub unit_id: i64,
    pub easy: Vec<i64>,
    pub normal: Vec<i64>,
    pub hard: Vec<i64>,
}

impl SeededUnit {
    pub fn all(&self) -> Vec<i64> {
        let mut ids = self.easy.clone();
        ids.extend(&self.normal);
        ids.extend(&self.hard);
        ids
    }
}

pub async fn seed_subject(pool: &SqlitePool) -> i64 {
    let n = SUBJECT_SEQ.fetch_add(1, Ordering::SeqCst);
    let now = chrono::Utc::now();
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO subjects (name, color_code, sort_order, created_at, updated_at)
         VALUES (?1, '#6B7280', ?2, ?3, ?3) RETURNING id",
    )
    .bind(format!("科目{}", n))
    .bind(n as i64)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed subject")
}

pub async fn seed_unit(pool: &SqlitePool, subject_id: i64) -> i64 {
    let now = chrono::Utc::now();
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO units (subject_id, name, grade, sort_order, created_at, updated_at)
         VALUES (?1, 'Lesson 1-5', 1, 1, ?2, ?2) RETURNING id",
    )
    .bind(subject_id)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed unit")
}

pub async fn seed_question(pool: &SqlitePool, unit_id: i64, difficulty: Difficulty, text: &str) -> i64 {
    let now = chrono::Utc::now();
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO questions (unit_id, question_type, difficulty, question_text, answer_text, hint, created_at, updated_at)
         VALUES (?1, 0, ?2, ?3, ?4, '名詞', ?5, ?5) RETURNING id",
    )
    .bind(unit_id)
    .bind(difficulty)
    .bind(text)
    .bind(format!("{}の答え", text))
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed question")
}

/// A fresh subject and unit holding the given number of kept questions per difficulty.
pub async fn seed_unit_with_questions(pool: &SqlitePool, easy: usize, normal: usize, hard: usize) -> SeededUnit {
    let subject_id = seed_subject(pool).await;
    let unit_id = seed_unit(pool, subject_id).await;

    let mut seeded = SeededUnit {
        subject_id,
        unit_id,
        easy: Vec::new(),
        normal: Vec::new(),
        hard: Vec::new(),
    };
    for i in 0..easy {
        seeded.easy.push(seed_question(pool, unit_id, Difficulty::Easy, &format!("easy-{i}")).await);
    }
    for i in 0..normal {
        seeded.normal.push(seed_question(pool, unit_id, Difficulty::Normal, &format!("normal-{i}")).await);
    }
    for i in 0..hard {
        seeded.hard.push(seed_question(pool, unit_id, Difficulty::Hard, &format!("hard-{i}")).await);
    }
    seeded
}
