use sqlx::{Executor, Sqlite, SqlitePool};
use validator::Validate;

use crate::dto::catalog_dto::{
    CreateQuestionPayload, CreateSubjectPayload, CreateUnitPayload, NewQuestion, QuestionFilter,
    QuestionResponse, UnitListQuery, UpdateQuestionPayload, UpdateSubjectPayload,
    UpdateUnitPayload,
};
use crate::dto::{page_window, Paginated};
use crate::error::{Error, Result};
use crate::models::question::{Difficulty, Question, QuestionType};
use crate::models::subject::Subject;
use crate::models::unit::Unit;
use crate::models::Visibility;
use crate::utils::time;

pub const QUESTIONS_PER_PAGE: i64 = 50;

/// Filters shared by the question list and the CSV export. `?1`..`?5` are
/// subject, unit, difficulty, type and a LIKE pattern escaped with `\`.
pub(crate) const QUESTION_FILTER_CLAUSE: &str = r#"
    (?1 IS NULL OR u.subject_id = ?1)
    AND (?2 IS NULL OR q.unit_id = ?2)
    AND (?3 IS NULL OR q.difficulty = ?3)
    AND (?4 IS NULL OR q.question_type = ?4)
    AND (?5 IS NULL
         OR q.question_text LIKE ?5 ESCAPE '\'
         OR q.answer_text LIKE ?5 ESCAPE '\'
         OR q.hint LIKE ?5 ESCAPE '\')
"#;

/// Substring pattern for the keyword, with LIKE wildcards matched literally.
pub(crate) fn keyword_pattern(filter: &QuestionFilter) -> Option<String> {
    filter.keyword.as_ref().map(|keyword| {
        let mut pattern = String::with_capacity(keyword.len() + 2);
        pattern.push('%');
        for c in keyword.chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    })
}

#[derive(Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Subjects

    pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY sort_order, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(subjects)
    }

    pub async fn get_subject(&self, subject_id: i64) -> Result<Subject> {
        sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = ?1")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(subject_not_found)
    }

    pub async fn create_subject(&self, payload: CreateSubjectPayload) -> Result<Subject> {
        payload.validate()?;
        let name = payload.name.trim().to_string();
        let color_code = payload
            .color_code
            .unwrap_or_else(|| Subject::default_color_for(&name).to_string());
        let now = time::now();

        let subject = sqlx::query_as::<_, Subject>(
            r#"
            INSERT INTO subjects (name, color_code, sort_order, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(color_code)
        .bind(payload.sort_order.unwrap_or(0))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_subject_name)?;

        tracing::info!(subject_id = subject.id, name = %subject.name, "subject created");
        Ok(subject)
    }

    pub async fn update_subject(&self, subject_id: i64, payload: UpdateSubjectPayload) -> Result<Subject> {
        payload.validate()?;
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            UPDATE subjects
            SET name = COALESCE(?1, name),
                color_code = COALESCE(?2, color_code),
                sort_order = COALESCE(?3, sort_order),
                updated_at = ?4
            WHERE id = ?5
            RETURNING *
            "#,
        )
        .bind(payload.name)
        .bind(payload.color_code)
        .bind(payload.sort_order)
        .bind(time::now())
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(duplicate_subject_name)?
        .ok_or_else(subject_not_found)?;
        Ok(subject)
    }

    // Units

    pub async fn list_units(&self, query: &UnitListQuery) -> Result<Vec<Unit>> {
        let units = sqlx::query_as::<_, Unit>(
            r#"
            SELECT * FROM units
            WHERE (?1 IS NULL OR subject_id = ?1)
              AND (?2 IS NULL OR grade = ?2)
            ORDER BY sort_order, id
            "#,
        )
        .bind(query.subject_id)
        .bind(query.grade)
        .fetch_all(&self.pool)
        .await?;
        Ok(units)
    }

    /// Units of one subject. An unknown subject is a not-found error rather
    /// than an empty list.
    pub async fn units_for_subject(&self, subject_id: i64) -> Result<Vec<Unit>> {
        self.get_subject(subject_id).await?;
        self.list_units(&UnitListQuery {
            subject_id: Some(subject_id),
            grade: None,
        })
        .await
    }

    pub async fn get_unit(&self, unit_id: i64) -> Result<Unit> {
        sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE id = ?1")
            .bind(unit_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(unit_not_found)
    }

    pub async fn create_unit(&self, payload: CreateUnitPayload) -> Result<Unit> {
        payload.validate()?;
        self.get_subject(payload.subject_id).await?;

        let unit = sqlx::query_as::<_, Unit>(
            r#"
            INSERT INTO units (subject_id, name, grade, sort_order, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING *
            "#,
        )
        .bind(payload.subject_id)
        .bind(payload.name.trim())
        .bind(payload.grade)
        .bind(payload.sort_order.unwrap_or(0))
        .bind(time::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(unit_id = unit.id, subject_id = unit.subject_id, "unit created");
        Ok(unit)
    }

    pub async fn update_unit(&self, unit_id: i64, payload: UpdateUnitPayload) -> Result<Unit> {
        payload.validate()?;
        sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units
            SET name = COALESCE(?1, name),
                grade = COALESCE(?2, grade),
                sort_order = COALESCE(?3, sort_order),
                updated_at = ?4
            WHERE id = ?5
            RETURNING *
            "#,
        )
        .bind(payload.name)
        .bind(payload.grade)
        .bind(payload.sort_order)
        .bind(time::now())
        .bind(unit_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(unit_not_found)
    }

    // Questions

    pub async fn list_questions(&self, filter: &QuestionFilter, page: Option<i64>) -> Result<Paginated<QuestionResponse>> {
        let (page, offset) = page_window(page, QUESTIONS_PER_PAGE);
        let kept = Visibility::KeptOnly.predicate("q");
        let pattern = keyword_pattern(filter);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM questions q JOIN units u ON u.id = q.unit_id WHERE {} AND {}",
            kept, QUESTION_FILTER_CLAUSE
        ))
        .bind(filter.subject_id)
        .bind(filter.unit_id)
        .bind(filter.difficulty)
        .bind(filter.question_type)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let questions = sqlx::query_as::<_, Question>(&format!(
            r#"
            SELECT q.* FROM questions q
            JOIN units u ON u.id = q.unit_id
            WHERE {} AND {}
            ORDER BY q.created_at DESC, q.id DESC
            LIMIT ?6 OFFSET ?7
            "#,
            kept, QUESTION_FILTER_CLAUSE
        ))
        .bind(filter.subject_id)
        .bind(filter.unit_id)
        .bind(filter.difficulty)
        .bind(filter.question_type)
        .bind(pattern.as_deref())
        .bind(QUESTIONS_PER_PAGE)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(
            questions.into_iter().map(QuestionResponse::from).collect(),
            total,
            page,
            QUESTIONS_PER_PAGE,
        ))
    }

    pub async fn recent_questions(&self, limit: i64) -> Result<Vec<QuestionResponse>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT * FROM questions q WHERE {} ORDER BY q.created_at DESC, q.id DESC LIMIT ?1",
            Visibility::KeptOnly.predicate("q")
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions.into_iter().map(QuestionResponse::from).collect())
    }

    pub async fn get_question(&self, question_id: i64) -> Result<Question> {
        fetch_question(&self.pool, question_id, Visibility::KeptOnly)
            .await?
            .ok_or_else(question_not_found)
    }

    pub async fn create_question(&self, payload: CreateQuestionPayload) -> Result<Question> {
        payload.validate()?;
        let new_question = payload.resolve()?;
        self.get_unit(new_question.unit_id).await?;

        let question = insert_question(&self.pool, &new_question).await?;
        tracing::info!(question_id = question.id, unit_id = question.unit_id, "question created");
        Ok(question)
    }

    pub async fn update_question(&self, question_id: i64, payload: UpdateQuestionPayload) -> Result<Question> {
        payload.validate()?;
        let question_type = payload
            .question_type
            .as_deref()
            .map(str::parse::<QuestionType>)
            .transpose()?;
        let difficulty = payload
            .difficulty
            .as_deref()
            .map(str::parse::<Difficulty>)
            .transpose()?;
        if let Some(unit_id) = payload.unit_id {
            self.get_unit(unit_id).await?;
        }

        sqlx::query_as::<_, Question>(&format!(
            r#"
            UPDATE questions
            SET unit_id = COALESCE(?1, unit_id),
                question_type = COALESCE(?2, question_type),
                difficulty = COALESCE(?3, difficulty),
                question_text = COALESCE(?4, question_text),
                answer_text = COALESCE(?5, answer_text),
                hint = COALESCE(?6, hint),
                answer_note = COALESCE(?7, answer_note),
                updated_at = ?8
            WHERE id = ?9 AND {}
            RETURNING *
            "#,
            Visibility::KeptOnly.predicate("questions")
        ))
        .bind(payload.unit_id)
        .bind(question_type)
        .bind(difficulty)
        .bind(payload.question_text)
        .bind(payload.answer_text)
        .bind(payload.hint)
        .bind(payload.answer_note)
        .bind(time::now())
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(question_not_found)
    }

    /// Soft delete. Sheets that already reference the question keep it.
    pub async fn discard_question(&self, question_id: i64) -> Result<()> {
        let now = time::now();
        let result = sqlx::query(
            "UPDATE questions SET discarded_at = ?1, updated_at = ?1 WHERE id = ?2 AND discarded_at IS NULL",
        )
        .bind(now)
        .bind(question_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(question_not_found());
        }
        tracing::info!(question_id, "question discarded");
        Ok(())
    }

    pub async fn restore_question(&self, question_id: i64) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET discarded_at = NULL, updated_at = ?1
            WHERE id = ?2 AND discarded_at IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(time::now())
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(question_not_found)?;

        tracing::info!(question_id, "question restored");
        Ok(question)
    }
}

pub(crate) async fn fetch_question<'e, E>(
    executor: E,
    question_id: i64,
    visibility: Visibility,
) -> Result<Option<Question>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let question = sqlx::query_as::<_, Question>(&format!(
        "SELECT * FROM questions q WHERE q.id = ?1 AND {}",
        visibility.predicate("q")
    ))
    .bind(question_id)
    .fetch_optional(executor)
    .await?;
    Ok(question)
}

/// Inserts one question. Callers check that the unit exists.
pub(crate) async fn insert_question<'e, E>(executor: E, question: &NewQuestion) -> Result<Question>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = time::now();
    let inserted = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (
            unit_id, question_type, difficulty, question_text, answer_text,
            hint, answer_note, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        RETURNING *
        "#,
    )
    .bind(question.unit_id)
    .bind(question.question_type)
    .bind(question.difficulty)
    .bind(&question.question_text)
    .bind(&question.answer_text)
    .bind(question.hint.as_deref())
    .bind(question.answer_note.as_deref())
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(inserted)
}

fn duplicate_subject_name(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::BadRequest("同じ名前の科目が既に存在します".to_string())
        }
        _ => Error::from(err),
    }
}

fn subject_not_found() -> Error {
    Error::NotFound("科目が見つかりません".to_string())
}

fn unit_not_found() -> Error {
    Error::NotFound("単元が見つかりません".to_string())
}

fn question_not_found() -> Error {
    Error::NotFound("問題が見つかりません".to_string())
}
