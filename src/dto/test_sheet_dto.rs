use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::catalog_dto::DifficultyCounts;
use crate::error::Result;
use crate::models::question::{Difficulty, DifficultyFilter, QuestionType};
use crate::models::test_sheet::{
    DEFAULT_INCLUDE_ANSWER, DEFAULT_INCLUDE_HINT, DEFAULT_QUESTION_COUNT,
    DEFAULT_SEPARATE_ANSWER_SHEET,
};

fn default_question_count() -> i64 {
    DEFAULT_QUESTION_COUNT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GenerateTestSheetPayload {
    pub subject_id: Option<i64>,
    #[validate(required(message = "単元を選択してください"))]
    pub unit_id: Option<i64>,
    /// One of `easy`, `normal`, `hard`; absent, empty or `mix` for no filter.
    pub difficulty: Option<String>,
    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 100, message = "問題数は1から100の範囲で指定してください"))]
    pub question_count: i64,
    pub include_hint: Option<bool>,
    pub include_answer: Option<bool>,
    pub separate_answer_sheet: Option<bool>,
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRequest {
    pub subject_id: Option<i64>,
    pub unit_id: i64,
    pub difficulty: DifficultyFilter,
    pub question_count: i64,
    pub include_hint: bool,
    pub include_answer: bool,
    pub separate_answer_sheet: bool,
}

impl GenerateTestSheetPayload {
    /// Runs field validation and resolves the difficulty selector.
    pub fn into_request(self) -> Result<SheetRequest> {
        self.validate()?;
        let difficulty = DifficultyFilter::parse(self.difficulty.as_deref())?;
        let unit_id = self.unit_id.ok_or_else(|| {
            crate::error::Error::BadRequest("unit_id is required".to_string())
        })?;
        Ok(SheetRequest {
            subject_id: self.subject_id,
            unit_id,
            difficulty,
            question_count: self.question_count,
            include_hint: self.include_hint.unwrap_or(DEFAULT_INCLUDE_HINT),
            include_answer: self.include_answer.unwrap_or(DEFAULT_INCLUDE_ANSWER),
            separate_answer_sheet: self
                .separate_answer_sheet
                .unwrap_or(DEFAULT_SEPARATE_ANSWER_SHEET),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTestSheetResponse {
    pub id: i64,
    pub unit_id: i64,
    pub difficulty: String,
    pub question_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AvailabilityQuery {
    pub unit_id: Option<i64>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub unit_id: i64,
    pub unit_name: String,
    pub difficulty: String,
    pub difficulty_label: String,
    pub available_count: i64,
    pub counts_by_difficulty: DifficultyCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkPrintedResponse {
    pub success: bool,
    pub printed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SheetListQuery {
    pub page: Option<i64>,
}

/// Joined row used for sheet listings.
#[derive(Debug, Clone, FromRow)]
pub struct TestSheetRow {
    pub id: i64,
    pub subject_id: i64,
    pub subject_name: String,
    pub subject_color: String,
    pub unit_id: i64,
    pub unit_name: String,
    pub grade: i64,
    pub difficulty: Option<Difficulty>,
    pub question_count: i64,
    pub include_hint: bool,
    pub include_answer: bool,
    pub separate_answer_sheet: bool,
    pub printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSheetSummary {
    pub id: i64,
    pub subject_id: i64,
    pub subject_name: String,
    pub subject_color: String,
    pub unit_id: i64,
    pub unit_name: String,
    pub grade_label: String,
    pub difficulty: String,
    pub difficulty_label: String,
    pub question_count: i64,
    pub include_hint: bool,
    pub include_answer: bool,
    pub separate_answer_sheet: bool,
    pub printed: bool,
    pub printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<TestSheetRow> for TestSheetSummary {
    fn from(row: TestSheetRow) -> Self {
        let filter = DifficultyFilter::from(row.difficulty);
        Self {
            id: row.id,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            subject_color: row.subject_color,
            unit_id: row.unit_id,
            unit_name: row.unit_name,
            grade_label: crate::models::unit::grade_label(row.grade),
            difficulty: filter.key().to_string(),
            difficulty_label: filter.label().to_string(),
            question_count: row.question_count,
            include_hint: row.include_hint,
            include_answer: row.include_answer,
            separate_answer_sheet: row.separate_answer_sheet,
            printed: row.printed_at.is_some(),
            printed_at: row.printed_at,
            created_at: row.created_at,
        }
    }
}

/// One numbered question as it appears on a sheet.
#[derive(Debug, Clone, FromRow)]
pub struct SheetQuestionRow {
    pub question_order: i64,
    pub question_id: i64,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub answer_text: String,
    pub hint: Option<String>,
    pub answer_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetQuestionView {
    pub order: i64,
    pub question_id: i64,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub question_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_note: Option<String>,
}

impl SheetQuestionView {
    pub fn from_row(row: SheetQuestionRow, include_hint: bool, include_answer: bool) -> Self {
        Self {
            order: row.question_order,
            question_id: row.question_id,
            question_type: row.question_type,
            difficulty: row.difficulty,
            question_text: row.question_text,
            hint: row.hint.filter(|_| include_hint),
            answer_text: Some(row.answer_text).filter(|_| include_answer),
            answer_note: row.answer_note.filter(|_| include_answer),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSheetDetail {
    #[serde(flatten)]
    pub summary: TestSheetSummary,
    pub questions: Vec<SheetQuestionView>,
}
