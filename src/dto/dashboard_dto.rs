use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::catalog_dto::{DifficultyCounts, QuestionResponse};
use super::test_sheet_dto::TestSheetSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubjectQuestionCount {
    pub subject_id: i64,
    pub subject_name: String,
    pub color_code: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_questions: i64,
    pub total_test_sheets: i64,
    pub questions_by_subject: Vec<SubjectQuestionCount>,
    pub questions_by_difficulty: DifficultyCounts,
    pub recent_test_sheets: Vec<TestSheetSummary>,
    pub recent_questions: Vec<QuestionResponse>,
}
