use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::trim_optional_string;
use crate::error::Result;
use crate::models::question::{Difficulty, Question, QuestionType};
use crate::models::unit::grade_label;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubjectPayload {
    #[validate(length(min = 1, message = "科目名を入力してください"))]
    pub name: String,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub color_code: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSubjectPayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub color_code: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUnitPayload {
    pub subject_id: i64,
    #[validate(length(min = 1, message = "単元名を入力してください"))]
    pub name: String,
    #[validate(range(min = 1, max = 3, message = "学年は1から3の範囲で指定してください"))]
    pub grade: i64,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUnitPayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 3, message = "学年は1から3の範囲で指定してください"))]
    pub grade: Option<i64>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnitListQuery {
    pub subject_id: Option<i64>,
    pub grade: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyCounts {
    pub easy: i64,
    pub normal: i64,
    pub hard: i64,
    pub total: i64,
}

impl DifficultyCounts {
    pub fn add(&mut self, difficulty: Difficulty, count: i64) {
        match difficulty {
            Difficulty::Easy => self.easy += count,
            Difficulty::Normal => self.normal += count,
            Difficulty::Hard => self.hard += count,
        }
        self.total += count;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSummary {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    pub grade: i64,
    pub grade_label: String,
    pub sort_order: i64,
    pub question_count: i64,
    pub question_counts_by_difficulty: DifficultyCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionPayload {
    pub unit_id: i64,
    pub question_type: Option<String>,
    pub difficulty: Option<String>,
    #[validate(length(min = 1, message = "問題文を入力してください"))]
    pub question_text: String,
    #[validate(length(min = 1, message = "解答を入力してください"))]
    pub answer_text: String,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub hint: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub answer_note: Option<String>,
}

/// A question ready for insertion, with its enumerations resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub unit_id: i64,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub answer_text: String,
    pub hint: Option<String>,
    pub answer_note: Option<String>,
}

impl CreateQuestionPayload {
    pub fn resolve(self) -> Result<NewQuestion> {
        let question_type = parse_or_default::<QuestionType>(self.question_type.as_deref())?;
        let difficulty = parse_or_default::<Difficulty>(self.difficulty.as_deref())?;
        Ok(NewQuestion {
            unit_id: self.unit_id,
            question_type,
            difficulty,
            question_text: self.question_text.trim().to_string(),
            answer_text: self.answer_text.trim().to_string(),
            hint: self.hint,
            answer_note: self.answer_note,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateQuestionPayload {
    pub unit_id: Option<i64>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub question_type: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub question_text: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub answer_text: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub hint: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub answer_note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuestionListQuery {
    pub subject_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub difficulty: Option<String>,
    pub question_type: Option<String>,
    pub keyword: Option<String>,
    pub page: Option<i64>,
}

/// `QuestionListQuery` with its enumerations parsed.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub subject_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub difficulty: Option<Difficulty>,
    pub question_type: Option<QuestionType>,
    pub keyword: Option<String>,
}

impl QuestionListQuery {
    pub fn filter(&self) -> Result<QuestionFilter> {
        Ok(QuestionFilter {
            subject_id: self.subject_id,
            unit_id: self.unit_id,
            difficulty: parse_optional(self.difficulty.as_deref())?,
            question_type: parse_optional(self.question_type.as_deref())?,
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: i64,
    pub unit_id: i64,
    pub question_type: QuestionType,
    pub question_type_label: String,
    pub difficulty: Difficulty,
    pub difficulty_label: String,
    pub question_text: String,
    pub answer_text: String,
    pub hint: Option<String>,
    pub answer_note: Option<String>,
    pub discarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            unit_id: q.unit_id,
            question_type: q.question_type,
            question_type_label: q.question_type.label().to_string(),
            difficulty: q.difficulty,
            difficulty_label: q.difficulty.label().to_string(),
            discarded: !q.is_kept(),
            question_text: q.question_text,
            answer_text: q.answer_text,
            hint: q.hint,
            answer_note: q.answer_note,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeOption {
    pub value: i64,
    pub label: String,
}

pub fn grade_options() -> Vec<GradeOption> {
    crate::models::unit::VALID_GRADES
        .map(|grade| GradeOption {
            value: grade,
            label: grade_label(grade),
        })
        .collect()
}

fn parse_or_default<T>(raw: Option<&str>) -> Result<T>
where
    T: std::str::FromStr<Err = crate::models::UnknownVariant> + Default,
{
    Ok(parse_optional(raw)?.unwrap_or_default())
}

fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = crate::models::UnknownVariant>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(s.parse()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(question_type: Option<&str>, difficulty: Option<&str>) -> CreateQuestionPayload {
        CreateQuestionPayload {
            unit_id: 1,
            question_type: question_type.map(str::to_string),
            difficulty: difficulty.map(str::to_string),
            question_text: " achieve ".into(),
            answer_text: "達成する".into(),
            hint: None,
            answer_note: None,
        }
    }

    #[test]
    fn resolve_applies_defaults() {
        let q = payload(None, None).resolve().unwrap();
        assert_eq!(q.question_type, QuestionType::Word);
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert_eq!(q.question_text, "achieve");
    }

    #[test]
    fn resolve_rejects_unknown_difficulty() {
        assert!(payload(Some("sentence"), Some("extreme")).resolve().is_err());
    }

    #[test]
    fn grade_options_cover_three_grades() {
        let labels: Vec<String> = grade_options().into_iter().map(|g| g.label).collect();
        assert_eq!(labels, vec!["高1", "高2", "高3"]);
    }
}
