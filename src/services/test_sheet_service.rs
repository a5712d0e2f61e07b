use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use crate::dto::test_sheet_dto::{
    SheetQuestionRow, SheetQuestionView, SheetRequest, TestSheetDetail, TestSheetRow,
    TestSheetSummary,
};
use crate::dto::{page_window, Paginated};
use crate::error::{Error, Result};
use crate::models::test_sheet::{TestSheet, MAX_QUESTION_COUNT, MIN_QUESTION_COUNT};
use crate::models::Visibility;
use crate::services::inventory_service::candidate_ids;
use crate::utils::time;

pub const SHEETS_PER_PAGE: i64 = 20;

const SHEET_ROW_SELECT: &str = r#"
    SELECT
        ts.id,
        ts.subject_id,
        s.name AS subject_name,
        s.color_code AS subject_color,
        ts.unit_id,
        u.name AS unit_name,
        u.grade,
        ts.difficulty,
        ts.question_count,
        ts.include_hint,
        ts.include_answer,
        ts.separate_answer_sheet,
        ts.printed_at,
        ts.created_at
    FROM test_sheets ts
    JOIN subjects s ON s.id = ts.subject_id
    JOIN units u ON u.id = ts.unit_id
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetListing {
    All,
    PrintedOnly,
}

#[derive(Clone)]
pub struct TestSheetService {
    pool: SqlitePool,
}

impl TestSheetService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a sheet and its numbered questions in one transaction.
    ///
    /// When the candidate pool is smaller than the requested count the
    /// transaction is rolled back, so no sheet row survives.
    pub async fn generate(&self, request: SheetRequest) -> Result<TestSheet> {
        let requested = request.question_count;
        if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&requested) {
            return Err(Error::BadRequest(format!(
                "問題数は{}から{}の範囲で指定してください",
                MIN_QUESTION_COUNT, MAX_QUESTION_COUNT
            )));
        }

        // Write first: the transaction holds the write lock from its first
        // statement, so concurrent generations wait on the busy timeout.
        let mut tx = self.pool.begin().await?;

        let now = time::now();
        let sheet = sqlx::query_as::<_, TestSheet>(
            r#"
            INSERT INTO test_sheets (
                subject_id, unit_id, difficulty, question_count,
                include_hint, include_answer, separate_answer_sheet,
                created_at, updated_at
            )
            SELECT u.subject_id, u.id, ?2, ?3, ?4, ?5, ?6, ?7, ?7
            FROM units u
            WHERE u.id = ?1
            RETURNING *
            "#,
        )
        .bind(request.unit_id)
        .bind(request.difficulty.level())
        .bind(requested)
        .bind(request.include_hint)
        .bind(request.include_answer)
        .bind(request.separate_answer_sheet)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(sheet) = sheet else {
            tx.rollback().await?;
            return Err(Error::NotFound("単元が見つかりません".to_string()));
        };

        if request.subject_id.is_some_and(|id| id != sheet.subject_id) {
            tx.rollback().await?;
            return Err(Error::BadRequest(
                "選択された単元は指定の科目に属していません".to_string(),
            ));
        }

        let candidates = candidate_ids(&mut *tx, sheet.unit_id, request.difficulty).await?;
        let available = candidates.len() as i64;
        if available < requested {
            tx.rollback().await?;
            tracing::info!(
                unit_id = sheet.unit_id,
                difficulty = request.difficulty.key(),
                available,
                requested,
                "not enough questions for test sheet"
            );
            return Err(Error::InsufficientQuestions {
                available,
                requested,
            });
        }

        let picked = {
            let mut rng = rand::thread_rng();
            sample_ids(candidates, requested as usize, &mut rng)
        };
        insert_assignments(&mut tx, sheet.id, &picked, now).await?;
        tx.commit().await?;

        tracing::info!(
            sheet_id = sheet.id,
            unit_id = sheet.unit_id,
            difficulty = request.difficulty.key(),
            available,
            requested,
            "test sheet generated"
        );
        Ok(sheet)
    }

    #[cfg(test)]
    async fn get(&self, sheet_id: i64) -> Result<TestSheet> {
        sqlx::query_as::<_, TestSheet>(&format!(
            "SELECT * FROM test_sheets ts WHERE ts.id = ?1 AND {}",
            Visibility::KeptOnly.predicate("ts")
        ))
        .bind(sheet_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(sheet_not_found)
    }

    /// Records the first print time. Later calls leave it unchanged and
    /// return the stored value.
    pub async fn mark_printed(&self, sheet_id: i64) -> Result<DateTime<Utc>> {
        let printed_at = sqlx::query_scalar::<_, DateTime<Utc>>(&format!(
            r#"
            UPDATE test_sheets
            SET printed_at = COALESCE(printed_at, ?1),
                updated_at = CASE WHEN printed_at IS NULL THEN ?1 ELSE updated_at END
            WHERE id = ?2 AND {}
            RETURNING printed_at
            "#,
            Visibility::KeptOnly.predicate("test_sheets")
        ))
        .bind(time::now())
        .bind(sheet_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(sheet_not_found)?;

        tracing::debug!(sheet_id, %printed_at, "test sheet marked printed");
        Ok(printed_at)
    }

    /// Sheet with its questions in order. Questions discarded since generation
    /// are still shown.
    pub async fn get_detail(&self, sheet_id: i64) -> Result<TestSheetDetail> {
        let row = sqlx::query_as::<_, TestSheetRow>(&format!(
            "{} WHERE ts.id = ?1 AND {}",
            SHEET_ROW_SELECT,
            Visibility::KeptOnly.predicate("ts")
        ))
        .bind(sheet_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(sheet_not_found)?;

        let question_rows = sqlx::query_as::<_, SheetQuestionRow>(&format!(
            r#"
            SELECT
                tq.question_order,
                tq.question_id,
                q.question_type,
                q.difficulty,
                q.question_text,
                q.answer_text,
                q.hint,
                q.answer_note
            FROM test_questions tq
            JOIN questions q ON q.id = tq.question_id
            WHERE tq.test_sheet_id = ?1 AND {}
            ORDER BY tq.question_order
            "#,
            Visibility::IncludeDiscarded.predicate("q")
        ))
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?;

        let (include_hint, include_answer) = (row.include_hint, row.include_answer);
        let questions = question_rows
            .into_iter()
            .map(|q| SheetQuestionView::from_row(q, include_hint, include_answer))
            .collect();

        Ok(TestSheetDetail {
            summary: TestSheetSummary::from(row),
            questions,
        })
    }

    pub async fn list(&self, page: Option<i64>) -> Result<Paginated<TestSheetSummary>> {
        self.list_sheets(SheetListing::All, page).await
    }

    /// Printed sheets, most recently printed first.
    pub async fn history(&self, page: Option<i64>) -> Result<Paginated<TestSheetSummary>> {
        self.list_sheets(SheetListing::PrintedOnly, page).await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<TestSheetSummary>> {
        let rows = sqlx::query_as::<_, TestSheetRow>(&format!(
            "{} WHERE {} ORDER BY ts.created_at DESC, ts.id DESC LIMIT ?1",
            SHEET_ROW_SELECT,
            Visibility::KeptOnly.predicate("ts")
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TestSheetSummary::from).collect())
    }

    pub async fn discard(&self, sheet_id: i64) -> Result<()> {
        let now = time::now();
        let result = sqlx::query(
            "UPDATE test_sheets SET discarded_at = ?1, updated_at = ?1 WHERE id = ?2 AND discarded_at IS NULL",
        )
        .bind(now)
        .bind(sheet_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sheet_not_found());
        }
        tracing::info!(sheet_id, "test sheet discarded");
        Ok(())
    }

    async fn list_sheets(&self, listing: SheetListing, page: Option<i64>) -> Result<Paginated<TestSheetSummary>> {
        let (page, offset) = page_window(page, SHEETS_PER_PAGE);
        let (extra, order) = match listing {
            SheetListing::All => ("", "ts.created_at DESC, ts.id DESC"),
            SheetListing::PrintedOnly => (
                " AND ts.printed_at IS NOT NULL",
                "ts.printed_at DESC, ts.id DESC",
            ),
        };
        let kept = Visibility::KeptOnly.predicate("ts");

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM test_sheets ts WHERE {}{}",
            kept, extra
        ))
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, TestSheetRow>(&format!(
            "{} WHERE {}{} ORDER BY {} LIMIT ?1 OFFSET ?2",
            SHEET_ROW_SELECT, kept, extra, order
        ))
        .bind(SHEETS_PER_PAGE)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(
            rows.into_iter().map(TestSheetSummary::from).collect(),
            total,
            page,
            SHEETS_PER_PAGE,
        ))
    }
}

fn sheet_not_found() -> Error {
    Error::NotFound("テストが見つかりません".to_string())
}

/// Draws `amount` ids uniformly at random without replacement.
pub fn sample_ids<R: Rng + ?Sized>(mut ids: Vec<i64>, amount: usize, rng: &mut R) -> Vec<i64> {
    let amount = amount.min(ids.len());
    let (picked, _) = ids.partial_shuffle(rng, amount);
    picked.to_vec()
}

async fn insert_assignments(
    tx: &mut Transaction<'_, Sqlite>,
    sheet_id: i64,
    question_ids: &[i64],
    created_at: DateTime<Utc>,
) -> Result<()> {
    if question_ids.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::<Sqlite>::new(
        "INSERT INTO test_questions (test_sheet_id, question_id, question_order, created_at) ",
    );
    builder.push_values(question_ids.iter().enumerate(), |mut row, (idx, question_id)| {
        row.push_bind(sheet_id)
            .push_bind(*question_id)
            .push_bind(idx as i64 + 1)
            .push_bind(created_at);
    });
    builder.build().execute(&mut **tx).await?;
    Ok(())
}
