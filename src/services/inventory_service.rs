use std::collections::HashMap;

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::dto::catalog_dto::{DifficultyCounts, UnitSummary};
use crate::dto::test_sheet_dto::AvailabilityResponse;
use crate::error::{Error, Result};
use crate::models::question::{Difficulty, DifficultyFilter};
use crate::models::unit::Unit;
use crate::models::Visibility;

/// Read-only counts over kept questions. Nothing is cached, so every answer
/// reflects the soft-delete state at call time.
#[derive(Clone)]
pub struct InventoryService {
    pool: SqlitePool,
}

impl InventoryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count_available(&self, unit_id: i64, filter: DifficultyFilter) -> Result<i64> {
        let sql = format!(
            r#"
            SELECT COUNT(*) FROM questions q
            WHERE q.unit_id = ?1
              AND (?2 IS NULL OR q.difficulty = ?2)
              AND {}
            "#,
            Visibility::KeptOnly.predicate("q")
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(unit_id)
            .bind(filter.level())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn counts_by_difficulty(&self, unit_id: i64) -> Result<DifficultyCounts> {
        let sql = format!(
            r#"
            SELECT q.difficulty, COUNT(*) FROM questions q
            WHERE q.unit_id = ?1 AND {}
            GROUP BY q.difficulty
            "#,
            Visibility::KeptOnly.predicate("q")
        );
        let rows = sqlx::query_as::<_, (Difficulty, i64)>(&sql)
            .bind(unit_id)
            .fetch_all(&self.pool)
            .await?;

        let mut counts = DifficultyCounts::default();
        for (difficulty, count) in rows {
            counts.add(difficulty, count);
        }
        Ok(counts)
    }

    /// Per-unit difficulty breakdown for every unit of a subject.
    pub async fn counts_for_subject(&self, subject_id: i64) -> Result<HashMap<i64, DifficultyCounts>> {
        let sql = format!(
            r#"
            SELECT q.unit_id, q.difficulty, COUNT(*) FROM questions q
            JOIN units u ON u.id = q.unit_id
            WHERE u.subject_id = ?1 AND {}
            GROUP BY q.unit_id, q.difficulty
            "#,
            Visibility::KeptOnly.predicate("q")
        );
        let rows = sqlx::query_as::<_, (i64, Difficulty, i64)>(&sql)
            .bind(subject_id)
            .fetch_all(&self.pool)
            .await?;

        let mut by_unit: HashMap<i64, DifficultyCounts> = HashMap::new();
        for (unit_id, difficulty, count) in rows {
            by_unit.entry(unit_id).or_default().add(difficulty, count);
        }
        Ok(by_unit)
    }

    /// Attaches kept-question counts to units of one subject, keeping their order.
    pub async fn summarize_units(&self, subject_id: i64, units: Vec<Unit>) -> Result<Vec<UnitSummary>> {
        let mut counts = self.counts_for_subject(subject_id).await?;
        Ok(units
            .into_iter()
            .map(|unit| {
                let by_difficulty = counts.remove(&unit.id).unwrap_or_default();
                UnitSummary {
                    grade_label: unit.grade_label(),
                    id: unit.id,
                    subject_id: unit.subject_id,
                    name: unit.name,
                    grade: unit.grade,
                    sort_order: unit.sort_order,
                    question_count: by_difficulty.total,
                    question_counts_by_difficulty: by_difficulty,
                }
            })
            .collect())
    }

    pub async fn availability(&self, unit_id: i64, filter: DifficultyFilter) -> Result<AvailabilityResponse> {
        let unit = sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE id = ?1")
            .bind(unit_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("単元が見つかりません".to_string()))?;

        let available_count = self.count_available(unit.id, filter).await?;
        let counts_by_difficulty = self.counts_by_difficulty(unit.id).await?;

        Ok(AvailabilityResponse {
            unit_id: unit.id,
            unit_name: unit.name,
            difficulty: filter.key().to_string(),
            difficulty_label: filter.label().to_string(),
            available_count,
            counts_by_difficulty,
        })
    }
}

/// Ids of the candidate pool: kept questions of the unit matching the filter.
pub async fn candidate_ids<'e, E>(executor: E, unit_id: i64, filter: DifficultyFilter) -> Result<Vec<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        SELECT q.id FROM questions q
        WHERE q.unit_id = ?1
          AND (?2 IS NULL OR q.difficulty = ?2)
          AND {}
        ORDER BY q.id
        "#,
        Visibility::KeptOnly.predicate("q")
    );
    let ids = sqlx::query_scalar::<_, i64>(&sql)
        .bind(unit_id)
        .bind(filter.level())
        .fetch_all(executor)
        .await?;
    Ok(ids)
}
