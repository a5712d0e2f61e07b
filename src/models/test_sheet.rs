use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::question::{Difficulty, DifficultyFilter};

pub const MIN_QUESTION_COUNT: i64 = 1;
pub const MAX_QUESTION_COUNT: i64 = 100;
pub const DEFAULT_QUESTION_COUNT: i64 = 10;

pub const DEFAULT_INCLUDE_HINT: bool = false;
pub const DEFAULT_INCLUDE_ANSWER: bool = true;
pub const DEFAULT_SEPARATE_ANSWER_SHEET: bool = true;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestSheet {
    pub id: i64,
    pub subject_id: i64,
    pub unit_id: i64,
    /// `None` is a mix of all difficulties.
    pub difficulty: Option<Difficulty>,
    pub question_count: i64,
    pub include_hint: bool,
    pub include_answer: bool,
    pub separate_answer_sheet: bool,
    pub printed_at: Option<DateTime<Utc>>,
    pub discarded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestSheet {
    pub fn is_printed(&self) -> bool {
        self.printed_at.is_some()
    }

    pub fn difficulty_filter(&self) -> DifficultyFilter {
        DifficultyFilter::from(self.difficulty)
    }
}
