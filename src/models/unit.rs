use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::ops::RangeInclusive;

pub const VALID_GRADES: RangeInclusive<i64> = 1..=3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Unit {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    pub grade: i64,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    pub fn grade_label(&self) -> String {
        grade_label(self.grade)
    }
}

pub fn grade_label(grade: i64) -> String {
    format!("高{}", grade)
}
