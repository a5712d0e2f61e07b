use serde::{Deserialize, Serialize};

pub const CSV_HEADERS: [&str; 8] = [
    "subject_id",
    "unit_id",
    "question_type",
    "difficulty",
    "question_text",
    "answer_text",
    "hint",
    "answer_note",
];

/// One data row of a question CSV. `subject_id` is informational on import;
/// the unit decides the subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionCsvRow {
    #[serde(default)]
    pub subject_id: Option<i64>,
    pub unit_id: Option<i64>,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub answer_text: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub answer_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    /// Line number in the file; the header is line 1.
    pub row: u64,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub success_count: u64,
    pub errors: Vec<ImportRowError>,
}

impl ImportResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
