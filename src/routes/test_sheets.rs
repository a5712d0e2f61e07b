use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use crate::{
    dto::catalog_dto::UnitSummary,
    dto::test_sheet_dto::{
        AvailabilityQuery, GenerateTestSheetPayload, GenerateTestSheetResponse,
        MarkPrintedResponse, SheetListQuery,
    },
    error::{Error, Result},
    models::question::DifficultyFilter,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct UnitsBySubjectQuery {
    pub subject_id: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_subjects(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let subjects = state.catalog_service.list_subjects().await?;
    Ok(Json(subjects))
}

#[axum::debug_handler]
pub async fn list_units_for_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(unit_summaries(&state, subject_id).await?))
}

/// Query-string form of [`list_units_for_subject`] used by the kiosk page.
#[axum::debug_handler]
pub async fn units_by_subject(
    State(state): State<AppState>,
    Query(query): Query<UnitsBySubjectQuery>,
) -> Result<impl IntoResponse> {
    let subject_id = query
        .subject_id
        .ok_or_else(|| Error::BadRequest("subject_id is required".to_string()))?;
    Ok(Json(unit_summaries(&state, subject_id).await?))
}

async fn unit_summaries(state: &AppState, subject_id: i64) -> Result<Vec<UnitSummary>> {
    let units = state.catalog_service.units_for_subject(subject_id).await?;
    state
        .inventory_service
        .summarize_units(subject_id, units)
        .await
}

#[axum::debug_handler]
pub async fn available_questions(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse> {
    let unit_id = query
        .unit_id
        .ok_or_else(|| Error::BadRequest("unit_id is required".to_string()))?;
    let filter = DifficultyFilter::parse(query.difficulty.as_deref())?;
    let availability = state.inventory_service.availability(unit_id, filter).await?;
    Ok(Json(availability))
}

#[axum::debug_handler]
pub async fn create_test_sheet(
    State(state): State<AppState>,
    Json(payload): Json<GenerateTestSheetPayload>,
) -> Result<impl IntoResponse> {
    let request = payload.into_request()?;
    let sheet = state.test_sheet_service.generate(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(GenerateTestSheetResponse {
            id: sheet.id,
            unit_id: sheet.unit_id,
            difficulty: sheet.difficulty_filter().key().to_string(),
            question_count: sheet.question_count,
        }),
    ))
}

#[axum::debug_handler]
pub async fn get_test_sheet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let detail = state.test_sheet_service.get_detail(id).await?;
    Ok(Json(detail))
}

#[axum::debug_handler]
pub async fn mark_printed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let printed_at = state.test_sheet_service.mark_printed(id).await?;
    Ok(Json(MarkPrintedResponse {
        success: true,
        printed_at,
    }))
}

#[axum::debug_handler]
pub async fn list_test_sheets(
    State(state): State<AppState>,
    Query(query): Query<SheetListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.test_sheet_service.list(query.page).await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<SheetListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.test_sheet_service.history(query.page).await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn discard_test_sheet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.test_sheet_service.discard(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
