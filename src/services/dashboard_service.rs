use sqlx::SqlitePool;

use crate::dto::catalog_dto::DifficultyCounts;
use crate::dto::dashboard_dto::{DashboardStats, SubjectQuestionCount};
use crate::error::Result;
use crate::models::question::Difficulty;
use crate::models::Visibility;
use crate::services::catalog_service::CatalogService;
use crate::services::test_sheet_service::TestSheetService;

const RECENT_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct DashboardService {
    pool: SqlitePool,
    catalog: CatalogService,
    sheets: TestSheetService,
}

impl DashboardService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            catalog: CatalogService::new(pool.clone()),
            sheets: TestSheetService::new(pool.clone()),
            pool,
        }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        let kept_questions = Visibility::KeptOnly.predicate("q");

        let total_questions = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM questions q WHERE {}",
            kept_questions
        ))
        .fetch_one(&self.pool)
        .await?;

        let total_test_sheets = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM test_sheets ts WHERE {}",
            Visibility::KeptOnly.predicate("ts")
        ))
        .fetch_one(&self.pool)
        .await?;

        // Subjects without questions are listed with zero.
        let questions_by_subject = sqlx::query_as::<_, SubjectQuestionCount>(&format!(
            r#"
            SELECT
                s.id AS subject_id,
                s.name AS subject_name,
                s.color_code,
                COUNT(q.id) AS count
            FROM subjects s
            LEFT JOIN units u ON u.subject_id = s.id
            LEFT JOIN questions q ON q.unit_id = u.id AND {}
            GROUP BY s.id, s.name, s.color_code
            ORDER BY s.sort_order, s.id
            "#,
            kept_questions
        ))
        .fetch_all(&self.pool)
        .await?;

        let by_difficulty = sqlx::query_as::<_, (Difficulty, i64)>(&format!(
            "SELECT q.difficulty, COUNT(*) FROM questions q WHERE {} GROUP BY q.difficulty",
            kept_questions
        ))
        .fetch_all(&self.pool)
        .await?;
        let mut questions_by_difficulty = DifficultyCounts::default();
        for (difficulty, count) in by_difficulty {
            questions_by_difficulty.add(difficulty, count);
        }

        Ok(DashboardStats {
            total_questions,
            total_test_sheets,
            questions_by_subject,
            questions_by_difficulty,
            recent_test_sheets: self.sheets.recent(RECENT_LIMIT).await?,
            recent_questions: self.catalog.recent_questions(RECENT_LIMIT).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::test_sheet_dto::SheetRequest;
    use crate::models::question::DifficultyFilter;
    use crate::services::test_support::{seed_subject, seed_unit_with_questions, setup_test_db};

    #[tokio::test]
    async fn stats_count_only_kept_rows() {
        let pool = setup_test_db().await;
        let seeded = seed_unit_with_questions(&pool, 3, 2, 1).await;
        let empty_subject = seed_subject(&pool).await;
        let sheets = TestSheetService::new(pool.clone());
        let sheet = sheets
            .generate(SheetRequest {
                subject_id: None,
                unit_id: seeded.unit_id,
                difficulty: DifficultyFilter::Mix,
                question_count: 2,
                include_hint: false,
                include_answer: true,
                separate_answer_sheet: true,
            })
            .await
            .unwrap();
        sqlx::query("UPDATE questions SET discarded_at = ?1 WHERE id = ?2")
            .bind(chrono::Utc::now())
            .bind(seeded.hard[0])
            .execute(&pool)
            .await
            .unwrap();

        let stats = DashboardService::new(pool).stats().await.unwrap();
        assert_eq!(stats.total_questions, 5);
        assert_eq!(stats.total_test_sheets, 1);
        assert_eq!(stats.questions_by_difficulty.hard, 0);
        assert_eq!(stats.questions_by_difficulty.easy, 3);

        let seeded_row = stats
            .questions_by_subject
            .iter()
            .find(|row| row.subject_id == seeded.subject_id)
            .unwrap();
        assert_eq!(seeded_row.count, 5);
        let empty_row = stats
            .questions_by_subject
            .iter()
            .find(|row| row.subject_id == empty_subject)
            .unwrap();
        assert_eq!(empty_row.count, 0);

        assert_eq!(stats.recent_test_sheets[0].id, sheet.id);
        assert_eq!(stats.recent_questions.len(), 5);
    }
}
