use std::collections::HashMap;

use sqlx::{FromRow, SqlitePool};

use crate::dto::catalog_dto::{NewQuestion, QuestionFilter};
use crate::dto::import_dto::{ImportResult, ImportRowError, QuestionCsvRow, CSV_HEADERS};
use crate::error::{Error, Result};
use crate::models::question::{Difficulty, QuestionType};
use crate::models::Visibility;
use crate::services::catalog_service::{insert_question, keyword_pattern, QUESTION_FILTER_CLAUSE};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const REQUIRED_HEADERS: [&str; 3] = ["unit_id", "question_text", "answer_text"];

#[derive(Debug, FromRow)]
struct ExportRow {
    subject_id: i64,
    unit_id: i64,
    question_type: QuestionType,
    difficulty: Difficulty,
    question_text: String,
    answer_text: String,
    hint: Option<String>,
    answer_note: Option<String>,
}

#[derive(Clone)]
pub struct QuestionCsvService {
    pool: SqlitePool,
}

impl QuestionCsvService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Kept questions matching `filter`, oldest first, as CSV bytes with a
    /// header line.
    pub async fn export(&self, filter: &QuestionFilter) -> Result<Vec<u8>> {
        let rows = sqlx::query_as::<_, ExportRow>(&format!(
            r#"
            SELECT
                u.subject_id,
                q.unit_id,
                q.question_type,
                q.difficulty,
                q.question_text,
                q.answer_text,
                q.hint,
                q.answer_note
            FROM questions q
            JOIN units u ON u.id = q.unit_id
            WHERE {} AND {}
            ORDER BY q.id
            "#,
            Visibility::KeptOnly.predicate("q"),
            QUESTION_FILTER_CLAUSE
        ))
        .bind(filter.subject_id)
        .bind(filter.unit_id)
        .bind(filter.difficulty)
        .bind(filter.question_type)
        .bind(keyword_pattern(filter))
        .fetch_all(&self.pool)
        .await?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(CSV_HEADERS)?;
        for row in &rows {
            writer.write_record([
                row.subject_id.to_string().as_str(),
                row.unit_id.to_string().as_str(),
                row.question_type.key(),
                row.difficulty.key(),
                row.question_text.as_str(),
                row.answer_text.as_str(),
                row.hint.as_deref().unwrap_or_default(),
                row.answer_note.as_deref().unwrap_or_default(),
            ])?;
        }

        tracing::info!(rows = rows.len(), "questions exported");
        writer.into_inner().map_err(|e| Error::Io(e.into_error()))
    }

    /// Validates every data row on its own and inserts the valid ones.
    ///
    /// A malformed header aborts the whole import; row problems are collected
    /// in the result instead.
    pub async fn import(&self, data: &[u8]) -> Result<ImportResult> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data);

        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = REQUIRED_HEADERS
            .into_iter()
            .filter(|required| !headers.iter().any(|h| h == *required))
            .collect();
        if !missing.is_empty() {
            return Err(Error::BadRequest(format!(
                "CSVのヘッダーに必要な列がありません: {}",
                missing.join(", ")
            )));
        }

        let unit_subjects: HashMap<i64, i64> =
            sqlx::query_as::<_, (i64, i64)>("SELECT id, subject_id FROM units")
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .collect();

        let mut result = ImportResult::default();
        let mut accepted = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let fallback_row = idx as u64 + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    result.errors.push(ImportRowError {
                        row: e.position().map(|p| p.line()).unwrap_or(fallback_row),
                        message: format!("行を読み取れません: {}", e),
                    });
                    continue;
                }
            };
            let row = record.position().map(|p| p.line()).unwrap_or(fallback_row);

            let parsed = record
                .deserialize::<QuestionCsvRow>(Some(&headers))
                .map_err(|e| format!("行を解釈できません: {}", e))
                .and_then(|csv_row| resolve_row(csv_row, &unit_subjects));
            match parsed {
                Ok(question) => accepted.push(question),
                Err(message) => result.errors.push(ImportRowError { row, message }),
            }
        }

        let mut tx = self.pool.begin().await?;
        for question in &accepted {
            insert_question(&mut *tx, question).await?;
        }
        tx.commit().await?;
        result.success_count = accepted.len() as u64;

        tracing::info!(
            imported = result.success_count,
            rejected = result.errors.len(),
            "question import finished"
        );
        Ok(result)
    }
}

fn resolve_row(row: QuestionCsvRow, unit_subjects: &HashMap<i64, i64>) -> std::result::Result<NewQuestion, String> {
    let unit_id = row.unit_id.ok_or_else(|| "unit_idが空です".to_string())?;
    let subject_id = unit_subjects
        .get(&unit_id)
        .copied()
        .ok_or_else(|| format!("単元ID {} が見つかりません", unit_id))?;
    if row.subject_id.is_some_and(|given| given != subject_id) {
        return Err(format!("科目IDが単元ID {} の科目と一致しません", unit_id));
    }

    let question_type = row
        .question_type
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<QuestionType>)
        .transpose()
        .map_err(|e| format!("問題タイプが不正です: {}", e.value))?
        .unwrap_or_default();
    let difficulty = row
        .difficulty
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<Difficulty>)
        .transpose()
        .map_err(|e| format!("難易度が不正です: {}", e.value))?
        .unwrap_or_default();

    let question_text = non_blank(row.question_text).ok_or_else(|| "問題文が空です".to_string())?;
    let answer_text = non_blank(row.answer_text).ok_or_else(|| "解答が空です".to_string())?;

    Ok(NewQuestion {
        unit_id,
        question_type,
        difficulty,
        question_text,
        answer_text,
        hint: non_blank(row.hint),
        answer_note: non_blank(row.answer_note),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
