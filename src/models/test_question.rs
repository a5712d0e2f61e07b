use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One slot of a generated sheet. `question_order` runs 1..=N per sheet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestQuestion {
    pub id: i64,
    pub test_sheet_id: i64,
    pub question_id: i64,
    pub question_order: i64,
    pub created_at: DateTime<Utc>,
}
